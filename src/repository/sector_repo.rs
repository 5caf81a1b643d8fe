// ==========================================
// 排放数据导入 - 部门数据仓储
// ==========================================
// 对齐: sector 表
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::domain::{Sector, SectorStats};
use crate::repository::bulk_store::SectorStore;
use crate::repository::database::Database;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::scope::TxScope;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::{debug, error};

pub struct SectorRepository {
    db: Database,
}

impl SectorRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn insert_all(conn: &Connection, sectors: &[Sector]) -> RepositoryResult<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO sector (id, country, name, parent_sector) VALUES (?1, ?2, ?3, ?4)",
        )?;

        let mut count = 0;
        for sector in sectors {
            count += stmt.execute(params![
                sector.id(),
                sector.country(),
                sector.name(),
                sector.parent_sector_name(),
            ])?;
        }

        Ok(count)
    }
}

#[async_trait]
impl SectorStore for SectorRepository {
    async fn import(&self, sectors: &[Sector], scope: Option<&TxScope>) -> RepositoryResult<()> {
        if sectors.is_empty() {
            return Ok(());
        }

        let inserted = self
            .db
            .with_write(scope, |conn| Self::insert_all(conn, sectors))
            .await
            .map_err(|e| {
                error!(error = %e, count = sectors.len(), "部门批量写入失败");
                e
            })?;

        if inserted == 0 {
            return Err(RepositoryError::NothingImported { entity: "sectors" });
        }

        debug!(count = inserted, "部门批量写入完成");
        Ok(())
    }

    async fn get_imported_stats(&self, scope: Option<&TxScope>) -> RepositoryResult<SectorStats> {
        self.db
            .with_connection(scope, |conn| {
                let (countries, sectors): (i64, i64) = conn.query_row(
                    "SELECT COUNT(DISTINCT country), COUNT(*) FROM sector",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;

                Ok(SectorStats {
                    total_countries: countries as u64,
                    total_sectors: sectors as u64,
                })
            })
            .await
    }

    async fn delete_all(&self) -> RepositoryResult<usize> {
        let deleted = self
            .db
            .with_write(None, |conn| Ok(conn.execute("DELETE FROM sector", [])?))
            .await?;

        if deleted == 0 {
            return Err(RepositoryError::NothingDeleted { entity: "sectors" });
        }
        Ok(deleted)
    }

    async fn count(&self, scope: Option<&TxScope>) -> RepositoryResult<u64> {
        self.db
            .with_connection(scope, |conn| {
                let n: i64 = conn.query_row("SELECT COUNT(*) FROM sector", [], |row| row.get(0))?;
                Ok(n as u64)
            })
            .await
    }
}
