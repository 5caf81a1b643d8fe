// ==========================================
// 排放数据导入 - 行抽取与校验
// ==========================================
// 输入: 原始行（列名 → 字符串或空）
// 输出: (Vec<Sector>, Vec<Emission>)
// 保留列: Country / Sector / Parent sector，其余列均视为年份
// ==========================================
// 策略: 快速失败（fail-fast），任一行出错则整批不返回任何实体
// ==========================================

use crate::domain::{Emission, Sector};
use crate::importer::error::{CsvParseError, CsvParseResult};
use std::collections::BTreeMap;
use tracing::debug;

/// 原始行: 列名 → 单元格（空单元格为 None）
pub type RawRow = BTreeMap<String, Option<String>>;

pub const COUNTRY_COLUMN: &str = "Country";
pub const SECTOR_COLUMN: &str = "Sector";
pub const PARENT_SECTOR_COLUMN: &str = "Parent sector";

/// 抽取结果
#[derive(Debug, Clone, Default)]
pub struct ExtractedData {
    pub sectors: Vec<Sector>,
    pub emissions: Vec<Emission>,
}

impl ExtractedData {
    /// 部门数 + 排放数（决定导入策略的总量）
    pub fn total_records(&self) -> usize {
        self.sectors.len() + self.emissions.len()
    }

    pub fn into_parts(self) -> (Vec<Sector>, Vec<Emission>) {
        (self.sectors, self.emissions)
    }
}

// ==========================================
// RowExtractor - 行抽取器
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct RowExtractor;

impl RowExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 将原始行转换为部门与排放记录
    ///
    /// # 错误
    /// - EmptyInput: 行序列为空
    /// - MissingRequiredField: Country 或 Sector 为空/缺失
    /// - InvalidYear / InvalidValue: 年份列名或单元格无法解析
    pub fn extract(&self, rows: &[RawRow]) -> CsvParseResult<ExtractedData> {
        if rows.is_empty() {
            return Err(CsvParseError::EmptyInput);
        }

        let mut data = ExtractedData::default();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;

            let (country, name) = match (non_blank(row, COUNTRY_COLUMN), non_blank(row, SECTOR_COLUMN)) {
                (Some(country), Some(name)) => (country, name),
                _ => return Err(CsvParseError::MissingRequiredField { row: row_number }),
            };

            let parent = non_blank(row, PARENT_SECTOR_COLUMN).map(str::to_string);
            let sector = Sector::new(country, name, parent);

            for (column, cell) in row.iter().filter(|(column, _)| !is_reserved(column)) {
                let year = parse_year(column).ok_or_else(|| CsvParseError::InvalidYear {
                    row: row_number,
                    column: column.clone(),
                })?;
                let value = parse_value(cell.as_deref()).ok_or_else(|| CsvParseError::InvalidValue {
                    row: row_number,
                    column: column.clone(),
                    value: cell.clone(),
                })?;

                data.emissions.push(Emission::new(sector.id(), year, value));
            }

            data.sectors.push(sector);
        }

        debug!(
            rows = rows.len(),
            sectors = data.sectors.len(),
            emissions = data.emissions.len(),
            "行抽取完成"
        );

        Ok(data)
    }
}

fn is_reserved(column: &str) -> bool {
    matches!(column, COUNTRY_COLUMN | SECTOR_COLUMN | PARENT_SECTOR_COLUMN)
}

fn non_blank<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    row.get(column)
        .and_then(|cell| cell.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_year(column: &str) -> Option<i32> {
    column.trim().parse::<i32>().ok()
}

// f64::from_str 接受 "inf"/"NaN"，这里只要有限值
fn parse_value(cell: Option<&str>) -> Option<f64> {
    cell.map(str::trim)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
