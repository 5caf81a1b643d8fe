// ==========================================
// 排放数据导入 - 导入统计
// ==========================================
// 用途: 导入完成后返回给调用方的汇总报告
// 约束: 纯数据，无 I/O
// ==========================================

use serde::{Deserialize, Serialize};

/// 最小/最大值区间
///
/// 无数据时按约定为 0/0（不是 null）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRange<T> {
    pub min: T,
    pub max: T,
}

impl<T> ValueRange<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

// ==========================================
// SectorStats - 部门统计
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorStats {
    pub total_countries: u64, // 去重国家数
    pub total_sectors: u64,   // 部门总数
}

// ==========================================
// EmissionStats - 排放统计
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionStats {
    pub emission_values: ValueRange<f64>,
    pub year_range: ValueRange<i32>,
    pub total_emissions: u64,
}

// ==========================================
// ImportStats - 导入汇总报告
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportStats {
    pub sectors: SectorStats,
    pub emissions: EmissionStats,
}

impl ImportStats {
    pub fn new(sectors: SectorStats, emissions: EmissionStats) -> Self {
        Self { sectors, emissions }
    }
}
