// ==========================================
// 排放数据导入 - 应用状态
// ==========================================
// 职责: 组装数据库、仓储、文件导入服务与编排器
// 入口: import_file（文件 → 解析校验 → 分批落库 → 统计）
// ==========================================

use crate::config::{ConfigManager, ImportSettings};
use crate::domain::ImportStats;
use crate::engine::{BatchOrchestrator, ImportPipelineError};
use crate::importer::CsvImportService;
use crate::repository::{
    Database, EmissionRepository, EmissionStore, ImportLogRepository, RepositoryError,
    RepositoryResult, SectorRepository, SectorStore,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// 数据库路径环境变量
pub const ENV_DB_PATH: &str = "EMISSIONS_IMPORT_DB";

pub type DefaultOrchestrator =
    BatchOrchestrator<SectorRepository, EmissionRepository, ImportLogRepository>;

/// 应用状态
pub struct AppState {
    /// 数据库路径（内存库为 ":memory:"）
    pub db_path: String,

    pub database: Database,

    pub sector_repo: Arc<SectorRepository>,
    pub emission_repo: Arc<EmissionRepository>,
    pub import_log_repo: Arc<ImportLogRepository>,

    pub config_manager: Arc<ConfigManager>,

    import_service: CsvImportService,
    orchestrator: DefaultOrchestrator,
}

impl AppState {
    /// 打开（必要时创建）数据库并组装各组件
    pub fn new(db_path: String, settings: ImportSettings) -> RepositoryResult<Self> {
        info!(db_path = %db_path, "初始化AppState");
        let database = Database::open(&db_path)?;
        Ok(Self::assemble(db_path, database, settings))
    }

    /// 打开数据库，导入配置取 base 并由 config_kv 中已存的键覆写
    pub async fn with_stored_settings(db_path: String, base: ImportSettings) -> RepositoryResult<Self> {
        let database = Database::open(&db_path)?;
        let config_manager = ConfigManager::from_database(database.clone());
        let settings = config_manager
            .overlay(base)
            .await
            .map_err(|e| RepositoryError::Other(anyhow::anyhow!(e)))?;

        Ok(Self::assemble(db_path, database, settings))
    }

    /// 内存数据库（测试用）
    pub fn in_memory(settings: ImportSettings) -> RepositoryResult<Self> {
        let database = Database::open_in_memory()?;
        Ok(Self::assemble(":memory:".to_string(), database, settings))
    }

    fn assemble(db_path: String, database: Database, settings: ImportSettings) -> Self {
        let sector_repo = Arc::new(SectorRepository::new(database.clone()));
        let emission_repo = Arc::new(EmissionRepository::new(database.clone()));
        let import_log_repo = Arc::new(ImportLogRepository::new(database.clone()));
        let config_manager = Arc::new(ConfigManager::from_database(database.clone()));

        let orchestrator = BatchOrchestrator::new(
            database.clone(),
            sector_repo.clone(),
            emission_repo.clone(),
            import_log_repo.clone(),
            settings,
        );

        Self {
            db_path,
            database,
            sector_repo,
            emission_repo,
            import_log_repo,
            config_manager,
            import_service: CsvImportService::default(),
            orchestrator,
        }
    }

    pub fn settings(&self) -> &ImportSettings {
        self.orchestrator.settings()
    }

    pub fn orchestrator(&self) -> &DefaultOrchestrator {
        &self.orchestrator
    }

    /// 端到端导入一个 CSV/Excel 文件
    ///
    /// 解析或校验失败时不触碰数据库
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub async fn import_file<P: AsRef<Path>>(&self, file_path: P) -> Result<ImportStats, ImportPipelineError> {
        let data = self.import_service.import(file_path.as_ref())?;
        let stats = self
            .orchestrator
            .run_import(&data.sectors, &data.emissions)
            .await?;
        Ok(stats)
    }

    /// 清空已导入数据: 先删排放记录，再删部门（emission.sector_id 外键约束）
    ///
    /// # 错误
    /// - NothingDeleted: 任一张表没有可删除的记录
    #[instrument(skip(self))]
    pub async fn delete_all(&self) -> RepositoryResult<DeletedCounts> {
        let emissions_deleted = self.emission_repo.delete_all().await?;
        let sectors_deleted = self.sector_repo.delete_all().await?;

        info!(sectors_deleted, emissions_deleted, "已清空导入数据");
        Ok(DeletedCounts {
            sectors_deleted,
            emissions_deleted,
        })
    }
}

/// delete_all 的删除行数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCounts {
    pub sectors_deleted: usize,
    pub emissions_deleted: usize,
}

/// 默认数据库路径
///
/// 优先级: 环境变量 EMISSIONS_IMPORT_DB → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(ENV_DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./emissions_import.db");
    if let Some(data_dir) = dirs::data_local_dir() {
        let dir = data_dir.join("emissions-import");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("emissions_import.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path_is_sqlite_file() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_client_error() {
        let state = AppState::in_memory(ImportSettings::default()).unwrap();

        let err = state.import_file("/nonexistent/emissions.csv").await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_delete_all_removes_emissions_before_sectors() {
        let state = AppState::in_memory(ImportSettings::default()).unwrap();
        let sector = crate::domain::Sector::new("ESP", "Energy", None);
        let emissions = vec![
            crate::domain::Emission::new(sector.id(), 2020, 1.0),
            crate::domain::Emission::new(sector.id(), 2021, 2.0),
        ];
        state
            .orchestrator()
            .run_import(std::slice::from_ref(&sector), &emissions)
            .await
            .unwrap();

        let counts = state.delete_all().await.unwrap();

        assert_eq!(
            counts,
            DeletedCounts {
                sectors_deleted: 1,
                emissions_deleted: 2,
            }
        );
        assert_eq!(state.sector_repo.count(None).await.unwrap(), 0);
    }
}
