// ==========================================
// 排放数据导入 - 端到端导入错误
// ==========================================

use crate::importer::CsvParseError;
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportPipelineError {
    #[error(transparent)]
    Parse(#[from] CsvParseError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ImportPipelineError {
    /// 输入问题（调用方可修正文件后重试）
    pub fn is_client_error(&self) -> bool {
        matches!(self, ImportPipelineError::Parse(_))
    }
}
