// ==========================================
// 排放数据导入 - 批量仓储 Trait
// ==========================================
// 职责: 定义只增的批量持久化与聚合读取接口（不包含业务逻辑）
// 约束: 传入事务作用域时必须在作用域内执行，不得自行开启重叠事务
// ==========================================

use crate::domain::{Emission, EmissionStats, ImportLog, Sector, SectorStats};
use crate::repository::error::RepositoryResult;
use crate::repository::scope::TxScope;
use async_trait::async_trait;

// ==========================================
// SectorStore Trait
// ==========================================
// 实现者: SectorRepository（使用 rusqlite）
#[async_trait]
pub trait SectorStore: Send + Sync {
    /// 批量插入部门
    ///
    /// # 错误
    /// - NothingImported: 输入非空但影响行数为 0
    async fn import(&self, sectors: &[Sector], scope: Option<&TxScope>) -> RepositoryResult<()>;

    /// 部门统计: 去重国家数 + 部门总数
    async fn get_imported_stats(&self, scope: Option<&TxScope>) -> RepositoryResult<SectorStats>;

    /// 删除全部部门
    ///
    /// 须先清空排放记录（emission.sector_id 外键），见 AppState::delete_all
    ///
    /// # 错误
    /// - NothingDeleted: 没有可删除的记录
    /// - ForeignKeyViolation: 仍有排放记录引用部门
    async fn delete_all(&self) -> RepositoryResult<usize>;

    /// 部门总数
    async fn count(&self, scope: Option<&TxScope>) -> RepositoryResult<u64>;
}

// ==========================================
// EmissionStore Trait
// ==========================================
// 实现者: EmissionRepository（使用 rusqlite）
#[async_trait]
pub trait EmissionStore: Send + Sync {
    /// 批量插入排放记录
    ///
    /// # 错误
    /// - NothingImported: 输入非空但影响行数为 0
    async fn import(&self, emissions: &[Emission], scope: Option<&TxScope>) -> RepositoryResult<()>;

    /// 排放统计: 总数 + 值区间 + 年份区间（无数据时均为 0）
    async fn get_imported_stats(&self, scope: Option<&TxScope>) -> RepositoryResult<EmissionStats>;

    /// 删除全部排放记录
    ///
    /// # 错误
    /// - NothingDeleted: 没有可删除的记录
    async fn delete_all(&self) -> RepositoryResult<usize>;

    /// 排放记录总数
    async fn count(&self, scope: Option<&TxScope>) -> RepositoryResult<u64>;
}

// ==========================================
// ImportLogStore Trait
// ==========================================
// 实现者: ImportLogRepository（使用 rusqlite）
#[async_trait]
pub trait ImportLogStore: Send + Sync {
    /// 写入一条导入审计日志
    async fn add_log(&self, total_rows: u64, scope: Option<&TxScope>) -> RepositoryResult<()>;

    /// 最近的导入日志（新 → 旧）
    async fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<ImportLog>>;
}
