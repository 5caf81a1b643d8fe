// ==========================================
// 排放数据导入 - 配置层
// ==========================================
// 职责: 导入配置（分批阈值、事务时间上限）
// 来源: 默认值 / 环境变量 / config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod import_settings;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::ImportConfigReader;
pub use import_settings::{ImportSettings, DEFAULT_BATCH_SIZE};
