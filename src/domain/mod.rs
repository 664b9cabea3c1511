// ==========================================
// 学校入驻数据加载器 - 领域模型层
// ==========================================
// 职责: 实体种类、单元格值、实体记录、标识符映射
// 红线: 不含数据访问逻辑,不含编排逻辑
// ==========================================

pub mod mappings;
pub mod records;
pub mod types;
pub mod value;

// 重导出核心类型
pub use mappings::{
    AlreadyPublished, HintMap, IdentifierMap, NaturalKeyMap, OwnerMap, Publication,
    PublishedMaps, ScopedKeyMap,
};
pub use records::{
    AttendanceEntry, ClassDiaryRecord, FeeSummaryRecord, GradeRecord, HomeworkRecord,
    InstallmentRecord, PayslipRecord, SalaryStructureRecord, SchoolRecord, SectionRecord,
    StudentRecord, SubjectRecord, TeacherGradeSectionLink, TeacherRecord, TeacherSubjectLink,
    TimeslotRecord, TimetableRecord,
};
pub use types::{EntityKind, Hint, Identifier};
pub use value::{make_row, number_rows, CellValue, FieldMap, Row, SheetRow};
