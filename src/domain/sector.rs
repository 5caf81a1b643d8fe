// ==========================================
// 排放数据导入 - 部门与排放领域模型
// ==========================================
// 约束: 只创建不修改（无 update 操作）
// 约束: Emission.sector_id 必须引用同一次抽取生成的 Sector.id
// ==========================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Sector - 部门
// ==========================================
// 无自然主键: id 在抽取时生成
// parent_sector_name 为按名称的反向引用（非外键），可指向本次导入之外的部门
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    id: String,
    country: String,
    name: String,
    parent_sector_name: Option<String>,
}

impl Sector {
    /// 使用新生成的 id 创建部门
    pub fn new(country: impl Into<String>, name: impl Into<String>, parent_sector_name: Option<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), country, name, parent_sector_name)
    }

    /// 使用指定 id 创建部门（用于回读持久化数据）
    pub fn with_id(
        id: impl Into<String>,
        country: impl Into<String>,
        name: impl Into<String>,
        parent_sector_name: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            country: country.into(),
            name: name.into(),
            parent_sector_name,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_sector_name(&self) -> Option<&str> {
        self.parent_sector_name.as_deref()
    }
}

// ==========================================
// Emission - 排放值（部门 × 年份）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emission {
    sector_id: String,
    year: i32,
    value: f64,
}

impl Emission {
    pub fn new(sector_id: impl Into<String>, year: i32, value: f64) -> Self {
        Self {
            sector_id: sector_id.into(),
            year,
            value,
        }
    }

    pub fn sector_id(&self) -> &str {
        &self.sector_id
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
