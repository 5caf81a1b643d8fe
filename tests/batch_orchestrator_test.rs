// ==========================================
// BatchOrchestrator 集成测试
// ==========================================
// 测试目标: 策略阈值、分批数量、分批失败语义、事务超时
// ==========================================


use async_trait::async_trait;
use emissions_import::config::ImportSettings;
use emissions_import::domain::{Emission, EmissionStats, Sector, SectorStats};
use emissions_import::engine::{BatchOrchestrator, ImportStrategy};
use emissions_import::logging;
use emissions_import::repository::{
    Database, EmissionRepository, EmissionStore, ImportLogRepository, ImportLogStore, RepositoryError,
    RepositoryResult, SectorRepository, SectorStore, TxScope,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_helpers::{build_dataset, create_test_db};

// ==========================================
// 测试用 SectorStore: 第 fail_on 次 import 调用时失败
// ==========================================
struct FlakySectorStore {
    inner: SectorRepository,
    fail_on: usize,
    calls: AtomicUsize,
    attempted_chunks: Mutex<Vec<usize>>,
}

impl FlakySectorStore {
    fn new(db: Database, fail_on: usize) -> Self {
        Self {
            inner: SectorRepository::new(db),
            fail_on,
            calls: AtomicUsize::new(0),
            attempted_chunks: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SectorStore for FlakySectorStore {
    async fn import(&self, sectors: &[Sector], scope: Option<&TxScope>) -> RepositoryResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.attempted_chunks.lock().unwrap().push(sectors.len());

        // 先写入，再失败: 验证本批次被回滚
        self.inner.import(sectors, scope).await?;
        if call == self.fail_on {
            return Err(RepositoryError::DatabaseQueryError(format!("injected failure on chunk {}", call)));
        }
        Ok(())
    }

    async fn get_imported_stats(&self, scope: Option<&TxScope>) -> RepositoryResult<SectorStats> {
        self.inner.get_imported_stats(scope).await
    }

    async fn delete_all(&self) -> RepositoryResult<usize> {
        self.inner.delete_all().await
    }

    async fn count(&self, scope: Option<&TxScope>) -> RepositoryResult<u64> {
        self.inner.count(scope).await
    }
}

// ==========================================
// 测试用 EmissionStore: 第 fail_on 次 import 调用时失败
// ==========================================
struct FlakyEmissionStore {
    inner: EmissionRepository,
    fail_on: usize,
    calls: AtomicUsize,
    attempted_chunks: Mutex<Vec<usize>>,
}

impl FlakyEmissionStore {
    fn new(db: Database, fail_on: usize) -> Self {
        Self {
            inner: EmissionRepository::new(db),
            fail_on,
            calls: AtomicUsize::new(0),
            attempted_chunks: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EmissionStore for FlakyEmissionStore {
    async fn import(&self, emissions: &[Emission], scope: Option<&TxScope>) -> RepositoryResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.attempted_chunks.lock().unwrap().push(emissions.len());

        self.inner.import(emissions, scope).await?;
        if call == self.fail_on {
            return Err(RepositoryError::DatabaseQueryError(format!("injected failure on chunk {}", call)));
        }
        Ok(())
    }

    async fn get_imported_stats(&self, scope: Option<&TxScope>) -> RepositoryResult<EmissionStats> {
        self.inner.get_imported_stats(scope).await
    }

    async fn delete_all(&self) -> RepositoryResult<usize> {
        self.inner.delete_all().await
    }

    async fn count(&self, scope: Option<&TxScope>) -> RepositoryResult<u64> {
        self.inner.count(scope).await
    }
}

type RepoOrchestrator = BatchOrchestrator<SectorRepository, EmissionRepository, ImportLogRepository>;

fn create_orchestrator(db: &Database, settings: ImportSettings) -> RepoOrchestrator {
    BatchOrchestrator::new(
        db.clone(),
        Arc::new(SectorRepository::new(db.clone())),
        Arc::new(EmissionRepository::new(db.clone())),
        Arc::new(ImportLogRepository::new(db.clone())),
        settings,
    )
}

#[tokio::test]
async fn test_total_equal_to_batch_size_uses_single_transaction() {
    logging::init_test();

    let db = Database::open_in_memory().unwrap();
    // 2 个部门 × 4 个年份 = 2 + 8 = 10 条
    let (sectors, emissions) = build_dataset(2, &[2018, 2019, 2020, 2021]);
    let orchestrator = create_orchestrator(&db, ImportSettings::default().with_batch_size(10));

    assert_eq!(orchestrator.plan(&sectors, &emissions), ImportStrategy::SingleTransaction);

    let stats = orchestrator.run_import(&sectors, &emissions).await.unwrap();
    assert_eq!(stats.sectors.total_sectors, 2);
    assert_eq!(stats.emissions.total_emissions, 8);
}

#[tokio::test]
async fn test_total_above_batch_size_uses_batches() {
    logging::init_test();

    let db = Database::open_in_memory().unwrap();
    // 11 个部门，无排放: 11 = batch_size + 1
    let (sectors, emissions) = build_dataset(11, &[]);
    let orchestrator = create_orchestrator(&db, ImportSettings::default().with_batch_size(10));

    assert_eq!(
        orchestrator.plan(&sectors, &emissions),
        ImportStrategy::Batched {
            sector_chunks: 2,
            emission_chunks: 0,
        }
    );

    let stats = orchestrator.run_import(&sectors, &emissions).await.unwrap();
    assert_eq!(stats.sectors.total_sectors, 11);
    assert_eq!(stats.emissions.total_emissions, 0);
    assert_eq!(stats.emissions.emission_values.min, 0.0);
}

#[tokio::test]
async fn test_batched_import_with_file_database() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let db = Database::open(&db_path).unwrap();
    let (sectors, emissions) = build_dataset(30, &[2015, 2016, 2017, 2018, 2019]);
    let orchestrator = create_orchestrator(&db, ImportSettings::default().with_batch_size(40));

    assert_eq!(
        orchestrator.plan(&sectors, &emissions),
        ImportStrategy::Batched {
            sector_chunks: 1,
            emission_chunks: 4,
        }
    );

    let stats = orchestrator.run_import(&sectors, &emissions).await.unwrap();
    assert_eq!(stats.sectors.total_sectors, 30);
    assert_eq!(stats.sectors.total_countries, 2);
    assert_eq!(stats.emissions.total_emissions, 150);
    assert_eq!(stats.emissions.year_range.min, 2015);
    assert_eq!(stats.emissions.year_range.max, 2019);

    // 每次顶层导入只写一条审计日志
    let logs = ImportLogRepository::new(db.clone()).find_recent(10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].total_rows, 150);
}

#[tokio::test]
async fn test_failed_sector_chunk_keeps_earlier_chunks() {
    logging::init_test();

    let db = Database::open_in_memory().unwrap();
    // batch_size = 4, 10 个部门 → 3 个部门批次（4 / 4 / 2）
    let (sectors, emissions) = build_dataset(10, &[2020]);
    let flaky = Arc::new(FlakySectorStore::new(db.clone(), 2));

    let orchestrator = BatchOrchestrator::new(
        db.clone(),
        flaky.clone(),
        Arc::new(EmissionRepository::new(db.clone())),
        Arc::new(ImportLogRepository::new(db.clone())),
        ImportSettings::default().with_batch_size(4),
    );
    assert_eq!(
        orchestrator.plan(&sectors, &emissions),
        ImportStrategy::Batched {
            sector_chunks: 3,
            emission_chunks: 3,
        }
    );

    let err = orchestrator.run_import(&sectors, &emissions).await.unwrap_err();
    assert!(matches!(err, RepositoryError::DatabaseQueryError(_)));

    // 第 1 批已提交，第 2 批回滚，第 3 批未执行
    assert_eq!(*flaky.attempted_chunks.lock().unwrap(), vec![4, 4]);
    let sector_repo = SectorRepository::new(db.clone());
    assert_eq!(sector_repo.count(None).await.unwrap(), 4);

    let persisted = sector_repo.get_imported_stats(None).await.unwrap();
    assert_eq!(persisted.total_sectors, 4);

    // 排放批次未开始，也没有审计日志
    let emission_repo = EmissionRepository::new(db.clone());
    assert_eq!(emission_repo.count(None).await.unwrap(), 0);
    let logs = ImportLogRepository::new(db.clone()).find_recent(10).await.unwrap();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn test_failed_emission_chunk_keeps_sectors_and_earlier_chunks() {
    logging::init_test();

    let db = Database::open_in_memory().unwrap();
    // batch_size = 4, 3 个部门 × 3 个年份 → 1 个部门批次，3 个排放批次（4 / 4 / 1）
    let (sectors, emissions) = build_dataset(3, &[2019, 2020, 2021]);
    let flaky = Arc::new(FlakyEmissionStore::new(db.clone(), 2));

    let orchestrator = BatchOrchestrator::new(
        db.clone(),
        Arc::new(SectorRepository::new(db.clone())),
        flaky.clone(),
        Arc::new(ImportLogRepository::new(db.clone())),
        ImportSettings::default().with_batch_size(4),
    );
    assert_eq!(
        orchestrator.plan(&sectors, &emissions),
        ImportStrategy::Batched {
            sector_chunks: 1,
            emission_chunks: 3,
        }
    );

    let err = orchestrator.run_import(&sectors, &emissions).await.unwrap_err();
    assert!(matches!(err, RepositoryError::DatabaseQueryError(ref msg) if msg.contains("chunk 2")));

    // 第 3 个排放批次未执行
    assert_eq!(*flaky.attempted_chunks.lock().unwrap(), vec![4, 4]);

    // 部门批次已全部提交
    let sector_repo = SectorRepository::new(db.clone());
    assert_eq!(sector_repo.count(None).await.unwrap(), 3);

    // 第 1 个排放批次已提交，第 2 个回滚
    let emission_repo = EmissionRepository::new(db.clone());
    assert_eq!(emission_repo.count(None).await.unwrap(), 4);

    let logs = ImportLogRepository::new(db.clone()).find_recent(10).await.unwrap();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn test_single_transaction_failure_persists_nothing() {
    logging::init_test();

    let db = Database::open_in_memory().unwrap();
    let (sectors, emissions) = build_dataset(3, &[2020]);
    let flaky = Arc::new(FlakySectorStore::new(db.clone(), 1));

    let orchestrator = BatchOrchestrator::new(
        db.clone(),
        flaky,
        Arc::new(EmissionRepository::new(db.clone())),
        Arc::new(ImportLogRepository::new(db.clone())),
        ImportSettings::default(),
    );

    assert!(orchestrator.run_import(&sectors, &emissions).await.is_err());

    let sector_repo = SectorRepository::new(db.clone());
    assert_eq!(sector_repo.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_zero_timeout_rolls_back_single_transaction() {
    logging::init_test();

    let db = Database::open_in_memory().unwrap();
    let (sectors, emissions) = build_dataset(2, &[2020, 2021]);
    let orchestrator = create_orchestrator(&db, ImportSettings::default().with_timeout(Duration::ZERO));

    let err = orchestrator.run_import(&sectors, &emissions).await.unwrap_err();
    assert!(matches!(err, RepositoryError::TransactionTimeout { .. }));

    let sector_repo = SectorRepository::new(db.clone());
    assert_eq!(sector_repo.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_wait_timeout_when_transaction_held() {
    logging::init_test();

    let db = Database::open_in_memory().unwrap();
    let (sectors, emissions) = build_dataset(1, &[2020]);
    let orchestrator = create_orchestrator(
        &db,
        ImportSettings::default().with_max_wait(Duration::from_millis(20)),
    );

    let held = db
        .begin(&Default::default(), "held by another caller")
        .await
        .unwrap();

    let err = orchestrator.run_import(&sectors, &emissions).await.unwrap_err();
    assert!(matches!(err, RepositoryError::TransactionWaitTimeout { .. }));

    held.rollback().unwrap();
}
