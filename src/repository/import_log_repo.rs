// ==========================================
// 排放数据导入 - 导入审计日志仓储
// ==========================================
// 对齐: import_log 表
// ==========================================

use crate::domain::ImportLog;
use crate::repository::bulk_store::ImportLogStore;
use crate::repository::database::Database;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::scope::TxScope;
use async_trait::async_trait;
use rusqlite::params;
use tracing::error;

pub struct ImportLogRepository {
    db: Database,
}

impl ImportLogRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImportLogStore for ImportLogRepository {
    async fn add_log(&self, total_rows: u64, scope: Option<&TxScope>) -> RepositoryResult<()> {
        let log = ImportLog::new(total_rows);

        self.db
            .with_write(scope, |conn| {
                conn.execute(
                    "INSERT INTO import_log (total_rows, created_at) VALUES (?1, ?2)",
                    params![log.total_rows as i64, log.created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| {
                error!(error = %e, total_rows, "导入日志写入失败");
                e
            })
    }

    async fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<ImportLog>> {
        self.db
            .with_connection(None, |conn| {
                let mut stmt = conn.prepare(
                    "SELECT total_rows, created_at FROM import_log ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit as i64], |row| {
                    let total_rows: i64 = row.get(0)?;
                    Ok(ImportLog {
                        total_rows: total_rows as u64,
                        created_at: row.get(1)?,
                    })
                })?;

                rows.collect::<Result<Vec<_>, _>>()
                    .map_err(RepositoryError::from)
            })
            .await
    }
}
