// ==========================================
// 排放数据导入 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv) / Excel (.xlsx/.xls)
// 约定: 表头与单元格去除首尾空白，空单元格为 None
// ==========================================

use crate::importer::error::{CsvParseError, CsvParseResult};
use crate::importer::importer_trait::FileParser;
use crate::importer::row_extractor::RawRow;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

fn ensure_exists(path: &Path) -> CsvParseResult<()> {
    if !path.exists() {
        return Err(CsvParseError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn to_cell(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// 每个表头都有对应键: 行尾缺失的单元格与空单元格一样记为 None
fn build_row(headers: &[String], cells: impl Iterator<Item = String>) -> RawRow {
    let mut cells = cells.fuse();
    let mut row = RawRow::new();
    for header in headers {
        let value = cells.next();
        if header.is_empty() {
            continue;
        }
        row.insert(header.clone(), value.as_deref().and_then(to_cell));
    }
    row
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> CsvParseResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row = build_row(&headers, record.iter().map(str::to_string));

            // 跳过完全空白的行
            if row.values().all(Option::is_none) {
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现（读取第一个工作表）
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> CsvParseResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| CsvParseError::Malformed("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut sheet_rows = range.rows();
        let header_row = match sheet_rows.next() {
            Some(row) => row,
            None => return Ok(Vec::new()),
        };
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for data_row in sheet_rows {
            let row = build_row(&headers, data_row.iter().map(|cell| cell.to_string()));

            if row.values().all(Option::is_none) {
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> CsvParseResult<Vec<RawRow>> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_to_raw_rows(file_path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_rows(file_path),
            _ => Err(CsvParseError::UnsupportedFormat(ext)),
        }
    }
}
