// ==========================================
// 排放数据导入 - 显式事务作用域
// ==========================================
// 由 BatchOrchestrator 通过 Database::begin 打开，并显式传入各仓储调用
// 约束: 仓储拿到作用域时只在其中执行，不再自行开启事务
// 约束: 未提交即被丢弃的作用域会回滚
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

/// 共享 SQLite 连接
pub type SharedConnection = Arc<Mutex<Connection>>;

pub(crate) fn lock_connection(conn: &SharedConnection) -> RepositoryResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}

/// 打开中的事务（可克隆的句柄，所有克隆指向同一个事务）
#[derive(Clone)]
pub struct TxScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    conn: SharedConnection,
    label: String,
    started_at: Instant,
    timeout: Duration,
    finished: AtomicBool,
    // 事务闸门许可，作用域结束后释放
    _permit: OwnedMutexGuard<()>,
}

impl TxScope {
    /// 在已执行 BEGIN 的连接上创建作用域
    pub(crate) fn new(
        conn: SharedConnection,
        label: String,
        timeout: Duration,
        permit: OwnedMutexGuard<()>,
    ) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                conn,
                label,
                started_at: Instant::now(),
                timeout,
                finished: AtomicBool::new(false),
                _permit: permit,
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    /// 校验作用域仍可用: 未提交/回滚，且未超过执行上限
    pub fn ensure_active(&self) -> RepositoryResult<()> {
        if self.is_finished() {
            return Err(RepositoryError::ScopeClosed(self.inner.label.clone()));
        }

        let elapsed = self.elapsed();
        if elapsed >= self.inner.timeout {
            return Err(RepositoryError::TransactionTimeout {
                label: self.inner.label.clone(),
                elapsed_ms: elapsed.as_millis() as u64,
                limit_ms: self.inner.timeout.as_millis() as u64,
            });
        }

        Ok(())
    }

    /// 获取作用域连接（先校验作用域状态）
    pub(crate) fn connection(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.ensure_active()?;
        lock_connection(&self.inner.conn)
    }

    /// 提交事务
    ///
    /// 超过执行上限时改为回滚并返回 TransactionTimeout
    pub fn commit(&self) -> RepositoryResult<()> {
        if let Err(err) = self.ensure_active() {
            if !self.is_finished() {
                self.rollback()?;
            }
            return Err(err);
        }

        let conn = lock_connection(&self.inner.conn)?;
        self.inner.finished.store(true, Ordering::Release);
        if let Err(e) = conn.execute_batch("COMMIT") {
            // COMMIT 失败时事务可能仍然打开
            if !conn.is_autocommit() {
                let _ = conn.execute_batch("ROLLBACK");
            }
            return Err(RepositoryError::DatabaseTransactionError(e.to_string()));
        }

        debug!(label = %self.inner.label, elapsed_ms = self.elapsed().as_millis() as u64, "事务已提交");
        Ok(())
    }

    /// 回滚事务（已结束时为空操作）
    pub fn rollback(&self) -> RepositoryResult<()> {
        if self.inner.finished.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let conn = lock_connection(&self.inner.conn)?;
        conn.execute_batch("ROLLBACK")
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(label = %self.inner.label, "事务已回滚");
        Ok(())
    }
}

impl std::fmt::Debug for TxScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxScope")
            .field("label", &self.inner.label)
            .field("elapsed", &self.elapsed())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        if self.finished.load(Ordering::Acquire) {
            return;
        }

        warn!(label = %self.label, "事务作用域未提交即被丢弃，执行回滚");
        match self.conn.lock() {
            Ok(conn) => {
                if let Err(e) = conn.execute_batch("ROLLBACK") {
                    warn!(label = %self.label, error = %e, "回滚失败");
                }
            }
            Err(e) => warn!(label = %self.label, error = %e, "回滚时锁获取失败"),
        }
    }
}
