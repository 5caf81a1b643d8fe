// ==========================================
// 排放数据导入 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 批量写入/删除校验 =====
    #[error("No {entity} were imported.")]
    NothingImported { entity: &'static str },

    #[error("No {entity} were found to delete.")]
    NothingDeleted { entity: &'static str },

    // ===== 事务错误 =====
    #[error("等待事务超时: 已等待 {waited_ms}ms")]
    TransactionWaitTimeout { waited_ms: u64 },

    #[error("事务执行超时 ({label}): 已执行 {elapsed_ms}ms，上限 {limit_ms}ms")]
    TransactionTimeout {
        label: String,
        elapsed_ms: u64,
        limit_ms: u64,
    },

    #[error("事务已结束: {0}")]
    ScopeClosed(String),

    // ===== 数据库错误 =====
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// 是否为超时类错误（等待或执行）
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            RepositoryError::TransactionWaitTimeout { .. } | RepositoryError::TransactionTimeout { .. }
        )
    }
}

// rusqlite 错误分类: 按 SQLite 扩展错误码区分约束类型
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ffi;

        let detail = err.to_string();
        match err.sqlite_error() {
            Some(e) => match e.extended_code {
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    RepositoryError::UniqueConstraintViolation(detail)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation(detail),
                ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED => RepositoryError::DatabaseTransactionError(detail),
                _ => RepositoryError::DatabaseQueryError(detail),
            },
            None => RepositoryError::DatabaseQueryError(detail),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
