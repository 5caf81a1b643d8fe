// ==========================================
// 排放数据导入 - 文件导入服务
// ==========================================
// 流程: 解析文件 → 行抽取/校验 → (sectors, emissions)
// 说明: 不负责落库，不管理上传文件的生命周期
// ==========================================

use crate::importer::error::CsvParseResult;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::FileParser;
use crate::importer::row_extractor::{ExtractedData, RowExtractor};
use std::path::Path;
use tracing::{info, instrument};

pub struct CsvImportService {
    file_parser: Box<dyn FileParser>,
    extractor: RowExtractor,
}

impl CsvImportService {
    pub fn new(file_parser: Box<dyn FileParser>) -> Self {
        Self {
            file_parser,
            extractor: RowExtractor::new(),
        }
    }

    /// 解析并抽取文件中的部门与排放记录
    ///
    /// # 返回
    /// - Ok(ExtractedData): 全部行均通过校验
    /// - Err(CsvParseError): 文件错误或任一行校验失败（不返回部分结果）
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import<P: AsRef<Path>>(&self, file_path: P) -> CsvParseResult<ExtractedData> {
        let rows = self.file_parser.parse_to_raw_rows(file_path.as_ref())?;
        info!(rows = rows.len(), "文件解析完成");

        let data = self.extractor.extract(&rows)?;
        info!(
            sectors = data.sectors.len(),
            emissions = data.emissions.len(),
            "行抽取完成"
        );

        Ok(data)
    }
}

impl Default for CsvImportService {
    fn default() -> Self {
        Self::new(Box::new(UniversalFileParser))
    }
}
