// ==========================================
// 排放数据导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 所有解析/校验错误均在落库前抛出
// ==========================================

use thiserror::Error;

/// CSV 解析与行校验错误
#[derive(Error, Debug)]
pub enum CsvParseError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Failed to parse CSV: {0}")]
    Malformed(String),

    // ===== 行校验错误 =====
    #[error("CSV file is empty")]
    EmptyInput,

    #[error("Row {row} is missing required fields: Country or Sector")]
    MissingRequiredField { row: usize },

    #[error("Row {row}: column '{column}' is not a valid year")]
    InvalidYear { row: usize, column: String },

    #[error("Row {row}: invalid value for year column '{column}': {value:?}")]
    InvalidValue {
        row: usize,
        column: String,
        value: Option<String>,
    },
}

impl CsvParseError {
    /// 出错行号（1 起），文件级错误返回 None
    pub fn row(&self) -> Option<usize> {
        match self {
            CsvParseError::MissingRequiredField { row }
            | CsvParseError::InvalidYear { row, .. }
            | CsvParseError::InvalidValue { row, .. } => Some(*row),
            _ => None,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for CsvParseError {
    fn from(err: std::io::Error) -> Self {
        CsvParseError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for CsvParseError {
    fn from(err: csv::Error) -> Self {
        CsvParseError::Malformed(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for CsvParseError {
    fn from(err: calamine::Error) -> Self {
        CsvParseError::Malformed(err.to_string())
    }
}

/// Result 类型别名
pub type CsvParseResult<T> = Result<T, CsvParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_row_and_column() {
        let err = CsvParseError::MissingRequiredField { row: 3 };
        assert_eq!(
            err.to_string(),
            "Row 3 is missing required fields: Country or Sector"
        );
        assert_eq!(err.row(), Some(3));

        let err = CsvParseError::InvalidValue {
            row: 2,
            column: "2021".to_string(),
            value: Some("abc".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 2"));
        assert!(msg.contains("2021"));

        assert_eq!(CsvParseError::EmptyInput.to_string(), "CSV file is empty");
        assert_eq!(CsvParseError::EmptyInput.row(), None);
    }
}
