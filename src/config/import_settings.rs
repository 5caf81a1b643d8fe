// ==========================================
// 排放数据导入 - 导入配置
// ==========================================
// 配置项: 分批阈值 / 事务等待上限 / 事务执行上限
// 来源: 默认值 → 环境变量 → config_kv 表（见 ConfigManager）
// ==========================================

use std::time::Duration;
use tracing::warn;

/// 默认分批阈值（部门 + 排放记录总数）
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

pub const ENV_BATCH_SIZE: &str = "EMISSIONS_IMPORT_BATCH_SIZE";
pub const ENV_MAX_WAIT_MS: &str = "EMISSIONS_IMPORT_MAX_WAIT_MS";
pub const ENV_TIMEOUT_MS: &str = "EMISSIONS_IMPORT_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    /// 分批阈值: 总量 <= batch_size 走单事务，否则分批（每批最多 batch_size 条）
    pub batch_size: usize,
    /// 获取事务上下文的最长等待时间
    pub max_wait: Duration,
    /// 单个事务体的最长执行时间
    pub timeout: Duration,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_wait: Duration::from_millis(crate::repository::database::DEFAULT_MAX_WAIT_MS),
            timeout: Duration::from_millis(crate::repository::database::DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ImportSettings {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 校验配置
    ///
    /// batch_size 必须 > 0；时间上限允许为 0（表示立即失败）
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size 必须大于 0".to_string());
        }
        Ok(())
    }

    /// 读取环境变量覆写（无法解析的值回退为默认值并告警）
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意 key → value 来源读取覆写
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut batch_size = parse_or(&lookup, ENV_BATCH_SIZE, defaults.batch_size);
        if batch_size == 0 {
            warn!(key = ENV_BATCH_SIZE, "分批阈值必须大于 0，使用默认值");
            batch_size = defaults.batch_size;
        }
        let max_wait_ms = parse_or(&lookup, ENV_MAX_WAIT_MS, defaults.max_wait.as_millis() as u64);
        let timeout_ms = parse_or(&lookup, ENV_TIMEOUT_MS, defaults.timeout.as_millis() as u64);

        Self {
            batch_size,
            max_wait: Duration::from_millis(max_wait_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

// 缺失返回默认值；格式错误告警后返回默认值
pub(crate) fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!(key = key, raw_value = %raw, "配置值格式错误，使用默认值");
            default
        }),
    }
}
