// ==========================================
// 排放数据导入 - 导入统计聚合
// ==========================================
// 职责: 并发获取部门/排放统计，合并为 ImportStats
// 约束: combine 为纯函数（无 I/O，相同输入得到相同输出）
// ==========================================

use crate::domain::{EmissionStats, ImportStats, SectorStats};
use crate::repository::{EmissionStore, RepositoryResult, SectorStore, TxScope};
use std::sync::Arc;
use tracing::debug;

pub struct StatsAggregator<S, E>
where
    S: SectorStore,
    E: EmissionStore,
{
    sector_store: Arc<S>,
    emission_store: Arc<E>,
}

impl<S, E> StatsAggregator<S, E>
where
    S: SectorStore,
    E: EmissionStore,
{
    pub fn new(sector_store: Arc<S>, emission_store: Arc<E>) -> Self {
        Self {
            sector_store,
            emission_store,
        }
    }

    /// 合并部门统计与排放统计
    pub fn combine(sectors: SectorStats, emissions: EmissionStats) -> ImportStats {
        ImportStats::new(sectors, emissions)
    }

    /// 同时发起两路统计查询，全部成功后合并
    ///
    /// 传入作用域时两路查询均在该事务内执行（可见未提交的写入）
    pub async fn fetch(&self, scope: Option<&TxScope>) -> RepositoryResult<ImportStats> {
        let (sectors, emissions) = futures::try_join!(
            self.sector_store.get_imported_stats(scope),
            self.emission_store.get_imported_stats(scope),
        )?;

        debug!(
            total_sectors = sectors.total_sectors,
            total_emissions = emissions.total_emissions,
            "导入统计已获取"
        );
        Ok(Self::combine(sectors, emissions))
    }
}
