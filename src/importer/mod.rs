// ==========================================
// 排放数据导入 - 导入层
// ==========================================
// 职责: 外部文件 → 原始行 → 部门/排放记录
// 支持: CSV, Excel
// ==========================================

pub mod csv_import_service;
pub mod error;
pub mod file_parser;
pub mod importer_trait;
pub mod row_extractor;

// 重导出核心类型
pub use csv_import_service::CsvImportService;
pub use error::{CsvParseError, CsvParseResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use importer_trait::FileParser;
pub use row_extractor::{ExtractedData, RawRow, RowExtractor};
