// ==========================================
// 排放数据导入 - 导入 Trait
// ==========================================
// 职责: 定义文件解析接口（不包含实现）
// ==========================================

use crate::importer::error::CsvParseResult;
use crate::importer::row_extractor::RawRow;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录（列名 → 单元格值）
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 行记录列表（保持文件顺序，空白行已跳过）
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_rows(&self, file_path: &Path) -> CsvParseResult<Vec<RawRow>>;
}
