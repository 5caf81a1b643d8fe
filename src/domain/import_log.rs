// ==========================================
// 排放数据导入 - 导入审计日志
// ==========================================
// 每次顶层导入写一条（不是每个批次一条）
// total_rows = 排放记录总数
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportLog {
    pub total_rows: u64,
    pub created_at: DateTime<Utc>,
}

impl ImportLog {
    pub fn new(total_rows: u64) -> Self {
        Self {
            total_rows,
            created_at: Utc::now(),
        }
    }
}
