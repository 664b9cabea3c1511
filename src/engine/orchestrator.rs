// ==========================================
// 学校入驻数据加载器 - 依赖有序写入编排器
// ==========================================
// 流程:
// 1. 依赖图拓扑排序
// 2. 检查目标表齐全
// 3. 逐种类: 开事务 → 阶段执行 → 提交 → 发布映射
// 红线:
// - 单线程顺序执行,一个连接,不并发
// - 每个种类一个事务; 失败只回滚当前种类,已提交的阶段保留
// - 映射只在阶段之间由编排器扩展
// ==========================================

use crate::config::LoadConfig;
use crate::db;
use crate::domain::mappings::PublishedMaps;
use crate::domain::types::EntityKind;
use crate::domain::value::SheetRow;
use crate::engine::dependency_graph::DependencyGraph;
use crate::importer::error::{LoadError, LoadResult};
use crate::importer::file_parser::{open_source, read_dataset, Dataset};
use crate::importer::row_normalizer::RowNormalizer;
use crate::importer::skip::StageSummary;
use crate::importer::stages::{run_stage, StageContext, StageOutput};
use rusqlite::Connection;
use tracing::{debug, info, info_span};
use uuid::Uuid;

// ==========================================
// LoadReport - 加载报告
// ==========================================
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub run_id: Uuid,
    /// 按执行顺序
    pub stages: Vec<StageSummary>,
    /// 本次运行发布的全部映射
    pub published: PublishedMaps,
}

impl LoadReport {
    pub fn stage(&self, kind: EntityKind) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.kind == kind)
    }

    pub fn total_upserted(&self) -> usize {
        self.stages.iter().map(|s| s.upserted).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.stages.iter().map(StageSummary::skipped_total).sum()
    }
}

// ==========================================
// LoadOrchestrator - 编排器
// ==========================================
pub struct LoadOrchestrator {
    graph: DependencyGraph,
    normalizer: RowNormalizer,
}

impl LoadOrchestrator {
    pub fn new(config: &LoadConfig) -> Self {
        Self {
            graph: DependencyGraph::standard(),
            normalizer: RowNormalizer::new(config.null_tokens.iter().cloned()),
        }
    }

    /// 执行一次完整加载
    ///
    /// # 参数
    /// - conn: 目标库连接（各阶段复用,不并发）
    /// - dataset: 全部工作表的行
    ///
    /// # 返回
    /// - Ok(LoadReport): 每个种类的汇总
    /// - Err: 表缺失、依赖环、某阶段数据库错误（该阶段已回滚）
    pub fn run(&self, conn: &mut Connection, dataset: &Dataset) -> LoadResult<LoadReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("load_run", %run_id);
        let _guard = span.enter();

        let order = self.graph.topological_order()?;
        debug!(order = ?order, "实体执行顺序");

        let tables: Vec<&str> = order.iter().map(|kind| kind.table_name()).collect();
        let missing = db::missing_tables(conn, &tables)?;
        if !missing.is_empty() {
            return Err(LoadError::MissingTables(missing));
        }

        info!(kinds = order.len(), rows = dataset.total_rows(), "开始加载");

        let mut maps = PublishedMaps::new();
        let mut stages = Vec::with_capacity(order.len());

        for kind in order {
            let rows = dataset.rows(kind);
            info!(kind = %kind, rows = rows.len(), "阶段开始");

            let output = self
                .run_kind(conn, kind, rows, &maps)
                .map_err(|e| e.in_stage(kind))?;

            for publication in output.publications {
                maps = maps.publish(publication)?;
            }

            let summary = output.summary;
            info!(
                kind = %kind,
                rows_seen = summary.rows_seen,
                upserted = summary.upserted,
                skipped = summary.skipped_total(),
                "阶段完成"
            );
            stages.push(summary);
        }

        let report = LoadReport {
            run_id,
            stages,
            published: maps,
        };
        info!(
            upserted = report.total_upserted(),
            skipped = report.total_skipped(),
            "加载完成"
        );
        Ok(report)
    }

    /// 单个种类: 一个事务覆盖写入与回读
    fn run_kind(
        &self,
        conn: &mut Connection,
        kind: EntityKind,
        rows: &[SheetRow],
        maps: &PublishedMaps,
    ) -> LoadResult<StageOutput> {
        let tx = conn.transaction()?;
        let output = {
            let ctx = StageContext {
                tx: &tx,
                maps,
                normalizer: &self.normalizer,
            };
            run_stage(kind, &ctx, rows)?
        };
        tx.commit()?;
        Ok(output)
    }
}

/// 按配置执行一次加载: 读取数据源 → 打开目标库 → 编排写入
///
/// 数据源读取在打开目标库之前完成,工作表缺失不会产生任何写入
pub fn run_load(config: &LoadConfig) -> LoadResult<LoadReport> {
    debug!(config = %config.snapshot_json()?, "加载配置");

    let mut source = open_source(config.source_path())?;
    let dataset = read_dataset(source.as_mut(), config)?;

    let mut conn = db::open_target(&config.database, config.busy_timeout_ms)?;
    LoadOrchestrator::new(config).run(&mut conn, &dataset)
}
