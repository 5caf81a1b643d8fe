// ==========================================
// 排放数据导入 - 分批导入编排器
// ==========================================
// 职责: 选择导入策略并执行，写入一条审计日志，返回导入统计
// 流程: 策略选择 → 部门落库 → 排放落库 → 审计日志 → 统计
// 约束: 编排器是唯一开启事务作用域的组件
// 约束: 分批严格串行，全部部门批次完成后才开始排放批次
// 风险: 分批模式下第 k 批失败时，1..k-1 批已提交，不做补偿回滚
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{Emission, ImportStats, Sector};
use crate::engine::stats_aggregator::StatsAggregator;
use crate::perf::PerfGuard;
use crate::repository::{
    Database, EmissionStore, ImportLogStore, RepositoryResult, SectorStore, TransactionOptions,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

// ==========================================
// ImportStrategy - 导入策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStrategy {
    /// 总量 <= 阈值: 单个原子事务
    SingleTransaction,
    /// 总量 > 阈值: 每批独立事务
    Batched {
        sector_chunks: usize,
        emission_chunks: usize,
    },
}

impl ImportStrategy {
    /// 根据记录总数选择策略
    pub fn select(sector_count: usize, emission_count: usize, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        if sector_count + emission_count <= batch_size {
            return ImportStrategy::SingleTransaction;
        }

        ImportStrategy::Batched {
            sector_chunks: sector_count.div_ceil(batch_size),
            emission_chunks: emission_count.div_ceil(batch_size),
        }
    }

    pub fn is_batched(&self) -> bool {
        matches!(self, ImportStrategy::Batched { .. })
    }
}

// ==========================================
// BatchOrchestrator - 导入编排器
// ==========================================
pub struct BatchOrchestrator<S, E, L>
where
    S: SectorStore,
    E: EmissionStore,
    L: ImportLogStore,
{
    db: Database,
    sector_store: Arc<S>,
    emission_store: Arc<E>,
    log_store: Arc<L>,
    stats: StatsAggregator<S, E>,
    settings: ImportSettings,
}

impl<S, E, L> BatchOrchestrator<S, E, L>
where
    S: SectorStore,
    E: EmissionStore,
    L: ImportLogStore,
{
    pub fn new(
        db: Database,
        sector_store: Arc<S>,
        emission_store: Arc<E>,
        log_store: Arc<L>,
        settings: ImportSettings,
    ) -> Self {
        if let Err(msg) = settings.validate() {
            warn!(error = %msg, "导入配置无效，分批阈值按 1 处理");
        }

        Self {
            db,
            stats: StatsAggregator::new(sector_store.clone(), emission_store.clone()),
            sector_store,
            emission_store,
            log_store,
            settings,
        }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// 当前配置下的导入策略
    pub fn plan(&self, sectors: &[Sector], emissions: &[Emission]) -> ImportStrategy {
        ImportStrategy::select(sectors.len(), emissions.len(), self.settings.batch_size)
    }

    /// 导入入口
    ///
    /// # 返回
    /// - Ok(ImportStats): 导入后的全表统计
    /// - Err: 任一步骤失败（单事务模式下不落任何数据）
    #[instrument(skip(self, sectors, emissions), fields(sectors = sectors.len(), emissions = emissions.len()))]
    pub async fn run_import(
        &self,
        sectors: &[Sector],
        emissions: &[Emission],
    ) -> RepositoryResult<ImportStats> {
        let _perf = PerfGuard::new("import.run").with_records(sectors.len() + emissions.len());
        let strategy = self.plan(sectors, emissions);
        info!(
            ?strategy,
            batch_size = self.settings.batch_size,
            "导入策略已选定"
        );

        let stats = match strategy {
            ImportStrategy::SingleTransaction => self.import_in_single_transaction(sectors, emissions).await?,
            ImportStrategy::Batched { .. } => self.import_in_batches(sectors, emissions).await?,
        };

        info!(
            total_sectors = stats.sectors.total_sectors,
            total_countries = stats.sectors.total_countries,
            total_emissions = stats.emissions.total_emissions,
            "导入完成"
        );
        Ok(stats)
    }

    fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions::from(&self.settings)
    }

    fn batch_size(&self) -> usize {
        self.settings.batch_size.max(1)
    }

    // ===== 单事务 =====

    async fn import_in_single_transaction(
        &self,
        sectors: &[Sector],
        emissions: &[Emission],
    ) -> RepositoryResult<ImportStats> {
        let options = self.transaction_options();

        self.db
            .run_in_transaction(&options, "import", |scope| async move {
                self.sector_store.import(sectors, Some(&scope)).await?;
                self.emission_store.import(emissions, Some(&scope)).await?;
                self.log_store
                    .add_log(emissions.len() as u64, Some(&scope))
                    .await?;
                self.stats.fetch(Some(&scope)).await
            })
            .await
            .map_err(|e| {
                error!(error = %e, "单事务导入失败，已回滚");
                e
            })
    }

    // ===== 分批 =====

    async fn import_in_batches(
        &self,
        sectors: &[Sector],
        emissions: &[Emission],
    ) -> RepositoryResult<ImportStats> {
        let options = self.transaction_options();
        let batch_size = self.batch_size();

        let sector_chunks: Vec<&[Sector]> = sectors.chunks(batch_size).collect();
        let total = sector_chunks.len();
        for (index, chunk) in sector_chunks.into_iter().enumerate() {
            let label = format!("sectors batch {}/{}", index + 1, total);
            let _perf = PerfGuard::new("import.sector_batch").with_records(chunk.len());

            self.db
                .run_in_transaction(&options, &label, |scope| async move {
                    self.sector_store.import(chunk, Some(&scope)).await
                })
                .await
                .map_err(|e| {
                    error!(batch = index + 1, total, error = %e, "部门批次导入失败");
                    e
                })?;

            info!("sectors batch {}/{} completed ({} records)", index + 1, total, chunk.len());
        }

        let emission_chunks: Vec<&[Emission]> = emissions.chunks(batch_size).collect();
        let total = emission_chunks.len();
        for (index, chunk) in emission_chunks.into_iter().enumerate() {
            let label = format!("emissions batch {}/{}", index + 1, total);
            let _perf = PerfGuard::new("import.emission_batch").with_records(chunk.len());

            self.db
                .run_in_transaction(&options, &label, |scope| async move {
                    self.emission_store.import(chunk, Some(&scope)).await
                })
                .await
                .map_err(|e| {
                    error!(batch = index + 1, total, error = %e, "排放批次导入失败");
                    e
                })?;

            info!("emissions batch {}/{} completed ({} records)", index + 1, total, chunk.len());
        }

        // 审计日志与统计不在任何事务作用域内
        self.log_store.add_log(emissions.len() as u64, None).await?;
        self.stats.fetch(None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{EmissionRepository, ImportLogRepository, SectorRepository};
    use std::time::Duration;

    type Orchestrator = BatchOrchestrator<SectorRepository, EmissionRepository, ImportLogRepository>;

    fn orchestrator(db: &Database, settings: ImportSettings) -> Orchestrator {
        BatchOrchestrator::new(
            db.clone(),
            Arc::new(SectorRepository::new(db.clone())),
            Arc::new(EmissionRepository::new(db.clone())),
            Arc::new(ImportLogRepository::new(db.clone())),
            settings,
        )
    }

    fn dataset(sector_count: usize, years: &[i32]) -> (Vec<Sector>, Vec<Emission>) {
        let sectors: Vec<Sector> = (0..sector_count)
            .map(|i| Sector::new(if i % 2 == 0 { "ESP" } else { "FRA" }, format!("Sector {}", i), None))
            .collect();
        let emissions = sectors
            .iter()
            .flat_map(|s| years.iter().map(move |y| Emission::new(s.id(), *y, *y as f64 / 10.0)))
            .collect();
        (sectors, emissions)
    }

    #[test]
    fn test_strategy_at_threshold_is_single() {
        assert_eq!(ImportStrategy::select(2, 8, 10), ImportStrategy::SingleTransaction);
        assert_eq!(ImportStrategy::select(0, 0, 10), ImportStrategy::SingleTransaction);
    }

    #[test]
    fn test_strategy_above_threshold_is_batched() {
        assert_eq!(
            ImportStrategy::select(11, 0, 10),
            ImportStrategy::Batched {
                sector_chunks: 2,
                emission_chunks: 0,
            }
        );
        assert_eq!(
            ImportStrategy::select(3, 25, 10),
            ImportStrategy::Batched {
                sector_chunks: 1,
                emission_chunks: 3,
            }
        );
    }

    #[test]
    fn test_strategy_zero_batch_size_treated_as_one() {
        assert_eq!(
            ImportStrategy::select(2, 1, 0),
            ImportStrategy::Batched {
                sector_chunks: 2,
                emission_chunks: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_single_transaction_import() {
        let db = Database::open_in_memory().unwrap();
        let orch = orchestrator(&db, ImportSettings::default());
        let (sectors, emissions) = dataset(3, &[2020, 2021]);

        assert_eq!(orch.plan(&sectors, &emissions), ImportStrategy::SingleTransaction);
        let stats = orch.run_import(&sectors, &emissions).await.unwrap();

        assert_eq!(stats.sectors.total_sectors, 3);
        assert_eq!(stats.sectors.total_countries, 2);
        assert_eq!(stats.emissions.total_emissions, 6);
        assert_eq!(stats.emissions.year_range.min, 2020);
        assert_eq!(stats.emissions.year_range.max, 2021);

        let logs = ImportLogRepository::new(db.clone()).find_recent(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].total_rows, 6);
    }

    #[tokio::test]
    async fn test_batched_import_matches_single() {
        let db = Database::open_in_memory().unwrap();
        let orch = orchestrator(&db, ImportSettings::default().with_batch_size(4));
        let (sectors, emissions) = dataset(5, &[2019, 2020, 2021]);

        assert!(orch.plan(&sectors, &emissions).is_batched());
        let stats = orch.run_import(&sectors, &emissions).await.unwrap();

        assert_eq!(stats.sectors.total_sectors, 5);
        assert_eq!(stats.emissions.total_emissions, 15);

        let logs = ImportLogRepository::new(db.clone()).find_recent(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].total_rows, 15);
    }

    #[tokio::test]
    async fn test_single_transaction_timeout_persists_nothing() {
        let db = Database::open_in_memory().unwrap();
        let orch = orchestrator(&db, ImportSettings::default().with_timeout(Duration::ZERO));
        let (sectors, emissions) = dataset(2, &[2020]);

        let err = orch.run_import(&sectors, &emissions).await.unwrap_err();
        assert!(err.is_timeout());

        let sector_repo = SectorRepository::new(db.clone());
        assert_eq!(sector_repo.count(None).await.unwrap(), 0);
        let logs = ImportLogRepository::new(db.clone()).find_recent(10).await.unwrap();
        assert!(logs.is_empty());
    }
}
