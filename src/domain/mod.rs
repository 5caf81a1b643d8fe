// ==========================================
// 排放数据导入 - 领域模型层
// ==========================================
// 职责: 定义不可变的值记录（部门、排放、审计日志、统计）
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod import_log;
pub mod sector;
pub mod stats;

// 重导出核心类型
pub use import_log::ImportLog;
pub use sector::{Emission, Sector};
pub use stats::{EmissionStats, ImportStats, SectorStats, ValueRange};
