// ==========================================
// 排放数据导入 - 排放数据仓储
// ==========================================
// 对齐: emission 表（sector_id 外键 → sector.id）
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::domain::{Emission, EmissionStats, ValueRange};
use crate::repository::bulk_store::EmissionStore;
use crate::repository::database::Database;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::scope::TxScope;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::{debug, error};

pub struct EmissionRepository {
    db: Database,
}

impl EmissionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn insert_all(conn: &Connection, emissions: &[Emission]) -> RepositoryResult<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO emission (sector_id, year, value) VALUES (?1, ?2, ?3)",
        )?;

        let mut count = 0;
        for emission in emissions {
            count += stmt.execute(params![
                emission.sector_id(),
                emission.year(),
                emission.value(),
            ])?;
        }

        Ok(count)
    }
}

#[async_trait]
impl EmissionStore for EmissionRepository {
    async fn import(&self, emissions: &[Emission], scope: Option<&TxScope>) -> RepositoryResult<()> {
        if emissions.is_empty() {
            return Ok(());
        }

        let inserted = self
            .db
            .with_write(scope, |conn| Self::insert_all(conn, emissions))
            .await
            .map_err(|e| {
                error!(error = %e, count = emissions.len(), "排放批量写入失败");
                e
            })?;

        if inserted == 0 {
            return Err(RepositoryError::NothingImported { entity: "emissions" });
        }

        debug!(count = inserted, "排放批量写入完成");
        Ok(())
    }

    async fn get_imported_stats(&self, scope: Option<&TxScope>) -> RepositoryResult<EmissionStats> {
        self.db
            .with_connection(scope, |conn| {
                let stats = conn.query_row(
                    "SELECT COUNT(*), MIN(value), MAX(value), MIN(year), MAX(year) FROM emission",
                    [],
                    |row| {
                        let total: i64 = row.get(0)?;
                        let min_value: Option<f64> = row.get(1)?;
                        let max_value: Option<f64> = row.get(2)?;
                        let min_year: Option<i32> = row.get(3)?;
                        let max_year: Option<i32> = row.get(4)?;

                        // 无数据时按约定返回 0
                        Ok(EmissionStats {
                            emission_values: ValueRange::new(min_value.unwrap_or(0.0), max_value.unwrap_or(0.0)),
                            year_range: ValueRange::new(min_year.unwrap_or(0), max_year.unwrap_or(0)),
                            total_emissions: total as u64,
                        })
                    },
                )?;
                Ok(stats)
            })
            .await
    }

    async fn delete_all(&self) -> RepositoryResult<usize> {
        let deleted = self
            .db
            .with_write(None, |conn| Ok(conn.execute("DELETE FROM emission", [])?))
            .await?;

        if deleted == 0 {
            return Err(RepositoryError::NothingDeleted { entity: "emissions" });
        }
        Ok(deleted)
    }

    async fn count(&self, scope: Option<&TxScope>) -> RepositoryResult<u64> {
        self.db
            .with_connection(scope, |conn| {
                let n: i64 = conn.query_row("SELECT COUNT(*) FROM emission", [], |row| row.get(0))?;
                Ok(n as u64)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sector;
    use crate::repository::bulk_store::SectorStore;
    use crate::repository::sector_repo::SectorRepository;

    async fn seeded() -> (EmissionRepository, Sector) {
        let db = Database::open_in_memory().unwrap();
        let sector = Sector::new("ESP", "Energy", None);
        SectorRepository::new(db.clone())
            .import(std::slice::from_ref(&sector), None)
            .await
            .unwrap();
        (EmissionRepository::new(db), sector)
    }

    #[tokio::test]
    async fn test_empty_store_stats_are_zero() {
        let (repo, _) = seeded().await;

        let stats = repo.get_imported_stats(None).await.unwrap();
        assert_eq!(stats.emission_values, ValueRange::new(0.0, 0.0));
        assert_eq!(stats.year_range, ValueRange::new(0, 0));
        assert_eq!(stats.total_emissions, 0);
    }

    #[tokio::test]
    async fn test_import_and_stats() {
        let (repo, sector) = seeded().await;
        let emissions = vec![
            Emission::new(sector.id(), 2020, 10.5),
            Emission::new(sector.id(), 2021, 20.0),
            Emission::new(sector.id(), 1990, -3.25),
        ];

        repo.import(&emissions, None).await.unwrap();

        let stats = repo.get_imported_stats(None).await.unwrap();
        assert_eq!(stats.total_emissions, 3);
        assert_eq!(stats.emission_values, ValueRange::new(-3.25, 20.0));
        assert_eq!(stats.year_range, ValueRange::new(1990, 2021));
    }

    #[tokio::test]
    async fn test_orphan_emission_rejected() {
        let (repo, _) = seeded().await;

        let err = repo
            .import(&[Emission::new("missing-sector", 2020, 1.0)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
        assert_eq!(repo.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_all() {
        let (repo, sector) = seeded().await;

        assert!(matches!(
            repo.delete_all().await,
            Err(RepositoryError::NothingDeleted { entity: "emissions" })
        ));

        repo.import(&[Emission::new(sector.id(), 2020, 1.0)], None)
            .await
            .unwrap();
        assert_eq!(repo.delete_all().await.unwrap(), 1);
    }
}
