// ==========================================
// 排放数据导入 - 引擎层
// ==========================================
// 职责: 导入策略编排 + 导入统计聚合
// 红线: Engine 不拼 SQL，持久化全部通过仓储 Trait
// ==========================================

pub mod batch_orchestrator;
pub mod error;
pub mod stats_aggregator;

// 重导出核心引擎
pub use batch_orchestrator::{BatchOrchestrator, ImportStrategy};
pub use error::ImportPipelineError;
pub use stats_aggregator::StatsAggregator;
