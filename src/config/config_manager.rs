// ==========================================
// 排放数据导入 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表读取导入配置（scope_id='global'）
// 约束: 缺失键回退默认值，格式错误告警后回退默认值
// 约束: 读写经 Database 的事务闸门，不混入其他调用方打开中的事务
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::import_settings::{parse_or, ImportSettings};
use crate::repository::Database;
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use std::error::Error;
use std::time::Duration;

/// 配置键
pub mod config_keys {
    pub const IMPORT_BATCH_SIZE: &str = "import_batch_size";
    pub const IMPORT_MAX_WAIT_MS: &str = "import_max_wait_ms";
    pub const IMPORT_TIMEOUT_MS: &str = "import_timeout_ms";
}

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    db: Database,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（独立连接）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        Ok(Self {
            db: Database::open(db_path)?,
        })
    }

    /// 共用已有 Database（同一连接、同一事务闸门）
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub async fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let value = self
            .db
            .with_connection(None, |conn| {
                Ok(conn
                    .query_row(
                        "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                        params![key],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?)
            })
            .await?;

        Ok(value)
    }

    /// 写入/覆盖 global 配置值
    pub async fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        self.db
            .with_write(None, |conn| {
                conn.execute(
                    "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                     ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                    params![key, value],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    /// 用 config_kv 中已存在的键覆写 base（缺失键保留 base 的值）
    pub async fn overlay(&self, base: ImportSettings) -> ConfigResult<ImportSettings> {
        let batch_size = self
            .get_parsed_or(config_keys::IMPORT_BATCH_SIZE, base.batch_size)
            .await?;
        let max_wait_ms = self
            .get_parsed_or(config_keys::IMPORT_MAX_WAIT_MS, base.max_wait.as_millis() as u64)
            .await?;
        let timeout_ms = self
            .get_parsed_or(config_keys::IMPORT_TIMEOUT_MS, base.timeout.as_millis() as u64)
            .await?;

        let settings = ImportSettings {
            batch_size: if batch_size == 0 { base.batch_size } else { batch_size },
            max_wait: Duration::from_millis(max_wait_ms),
            timeout: Duration::from_millis(timeout_ms),
        };
        settings.validate()?;
        Ok(settings)
    }

    async fn get_parsed_or<T: std::str::FromStr>(&self, key: &str, default: T) -> ConfigResult<T> {
        let value = self.get_global_config_value(key).await?;
        Ok(parse_or(&|_: &str| value.clone(), key, default))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_batch_size(&self) -> ConfigResult<usize> {
        let default = ImportSettings::default().batch_size;
        let value = self.get_parsed_or(config_keys::IMPORT_BATCH_SIZE, default).await?;
        if value == 0 {
            tracing::warn!(config_key = config_keys::IMPORT_BATCH_SIZE, "分批阈值必须大于 0，使用默认值");
            return Ok(default);
        }
        Ok(value)
    }

    async fn get_max_wait_ms(&self) -> ConfigResult<u64> {
        let default = ImportSettings::default().max_wait.as_millis() as u64;
        self.get_parsed_or(config_keys::IMPORT_MAX_WAIT_MS, default).await
    }

    async fn get_timeout_ms(&self) -> ConfigResult<u64> {
        let default = ImportSettings::default().timeout.as_millis() as u64;
        self.get_parsed_or(config_keys::IMPORT_TIMEOUT_MS, default).await
    }
}
