// ==========================================
// 排放数据导入 - 应用层
// ==========================================
// 职责: 组件装配，供命令行入口与端到端测试使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DefaultOrchestrator, DeletedCounts, ENV_DB_PATH};
