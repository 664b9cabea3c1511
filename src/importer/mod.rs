// ==========================================
// 学校入驻数据加载器 - 导入层
// ==========================================
// 职责: 工作表读取、行标准化、引用解析、按实体写入
// 支持: Excel 工作簿, CSV 目录
// ==========================================

pub mod error;
pub mod file_parser;
pub mod hint_resolver;
pub mod natural_key;
pub mod row_normalizer;
pub mod skip;
pub mod stages;

// 重导出核心类型
pub use error::{LoadError, LoadResult};
pub use file_parser::{open_source, read_dataset, CsvDirectorySource, Dataset, SheetSource, WorkbookSource};
pub use hint_resolver::HintResolver;
pub use natural_key::NaturalKeyResolver;
pub use row_normalizer::{normalize, RowNormalizer, DEFAULT_NULL_TOKENS};
pub use skip::{SkipReason, StageSummary};
pub use stages::{run_stage, StageContext, StageOutput};
