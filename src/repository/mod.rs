// ==========================================
// 排放数据导入 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 批量只增持久化 + 聚合读取，屏蔽数据库细节
// 约束: 所有查询使用参数化
// 约束: 事务作用域只由编排器开启并显式传入
// ==========================================

pub mod bulk_store;
pub mod database;
pub mod emission_repo;
pub mod error;
pub mod import_log_repo;
pub mod scope;
pub mod sector_repo;

// 重导出核心仓储
pub use bulk_store::{EmissionStore, ImportLogStore, SectorStore};
pub use database::{Database, TransactionOptions};
pub use emission_repo::EmissionRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use import_log_repo::ImportLogRepository;
pub use scope::{SharedConnection, TxScope};
pub use sector_repo::SectorRepository;
