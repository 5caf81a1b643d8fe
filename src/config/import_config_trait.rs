// ==========================================
// 排放数据导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义编排器所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_settings::ImportSettings;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取分批阈值
    ///
    /// # 默认值
    /// - 10000
    async fn get_batch_size(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 获取事务等待上限（毫秒）
    ///
    /// # 默认值
    /// - 30000
    async fn get_max_wait_ms(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// 获取事务执行上限（毫秒）
    ///
    /// # 默认值
    /// - 60000
    async fn get_timeout_ms(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// 汇总为 ImportSettings
    async fn load_import_settings(&self) -> Result<ImportSettings, Box<dyn Error + Send + Sync>> {
        let settings = ImportSettings::default()
            .with_batch_size(self.get_batch_size().await?)
            .with_max_wait(std::time::Duration::from_millis(self.get_max_wait_ms().await?))
            .with_timeout(std::time::Duration::from_millis(self.get_timeout_ms().await?));
        settings.validate()?;
        Ok(settings)
    }
}
