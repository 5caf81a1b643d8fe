// ==========================================
// 排放数据导入 - 核心库
// ==========================================
// 流程: 原始行 → 抽取/校验 → (部门, 排放) → 编排器 → 批量仓储 → 导入统计
// 技术栈: Rust + SQLite (rusqlite) + tokio
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值记录
pub mod domain;

// 数据仓储层 - 批量持久化与事务作用域
pub mod repository;

// 引擎层 - 导入编排与统计
pub mod engine;

// 导入层 - 文件解析与行抽取
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/schema）
pub mod db;

// 日志系统
pub mod logging;

// SQL 性能观测
pub mod perf;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{Emission, EmissionStats, ImportLog, ImportStats, Sector, SectorStats, ValueRange};

pub use engine::{BatchOrchestrator, ImportPipelineError, ImportStrategy, StatsAggregator};

pub use importer::{CsvImportService, CsvParseError, RawRow, RowExtractor};

pub use repository::{Database, RepositoryError, TransactionOptions, TxScope};

pub use config::ImportSettings;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "emissions-import";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
