// ==========================================
// 排放数据导入 - 数据库句柄与事务管理
// ==========================================
// 职责: 持有共享连接 + 事务闸门，负责开启事务作用域
// 约束: 同一时刻最多一个打开的事务（闸门）
// 约束: 等待上限（max_wait）与执行上限（timeout）均由调用方传入
// ==========================================

use crate::config::ImportSettings;
use crate::db;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::scope::{lock_connection, SharedConnection, TxScope};
use rusqlite::Connection;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

/// 默认事务等待上限（毫秒）
pub const DEFAULT_MAX_WAIT_MS: u64 = 30_000;

/// 默认事务执行上限（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

// ==========================================
// TransactionOptions - 事务时间上限
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOptions {
    /// 获取事务上下文的最长等待时间
    pub max_wait: Duration,
    /// 事务体的最长执行时间
    pub timeout: Duration,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_millis(DEFAULT_MAX_WAIT_MS),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl From<&ImportSettings> for TransactionOptions {
    fn from(settings: &ImportSettings) -> Self {
        Self {
            max_wait: settings.max_wait,
            timeout: settings.timeout,
        }
    }
}

// ==========================================
// Database - 共享连接句柄
// ==========================================
#[derive(Clone)]
pub struct Database {
    conn: SharedConnection,
    gate: Arc<AsyncMutex<()>>,
}

impl Database {
    /// 从已有连接创建（不做 schema 初始化）
    pub fn new(conn: Connection) -> Self {
        Self::from_shared(Arc::new(Mutex::new(conn)))
    }

    pub fn from_shared(conn: SharedConnection) -> Self {
        Self {
            conn,
            gate: Arc::new(AsyncMutex::new(())),
        }
    }

    /// 打开数据库文件并初始化 schema
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = db::open_sqlite_connection(db_path)?;
        db::init_schema(&conn)?;
        let schema_version = db::read_schema_version(&conn)?;
        debug!(db_path = db_path, ?schema_version, "数据库已打开");
        Ok(Self::new(conn))
    }

    /// 内存数据库（测试用）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        db::configure_sqlite_connection(&conn)?;
        db::init_schema(&conn)?;
        Ok(Self::new(conn))
    }

    /// 共享连接（供仓储构造使用）
    pub fn shared_connection(&self) -> SharedConnection {
        self.conn.clone()
    }

    /// 开启事务作用域
    ///
    /// # 错误
    /// - TransactionWaitTimeout: 在 max_wait 内未拿到事务闸门
    /// - DatabaseTransactionError: BEGIN 失败
    pub async fn begin(&self, options: &TransactionOptions, label: &str) -> RepositoryResult<TxScope> {
        let permit = tokio::time::timeout(options.max_wait, self.gate.clone().lock_owned())
            .await
            .map_err(|_| RepositoryError::TransactionWaitTimeout {
                waited_ms: options.max_wait.as_millis() as u64,
            })?;

        {
            let conn = lock_connection(&self.conn)?;
            conn.execute_batch("BEGIN IMMEDIATE")
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        }

        debug!(label = label, "事务已开启");
        Ok(TxScope::new(
            self.conn.clone(),
            label.to_string(),
            options.timeout,
            permit,
        ))
    }

    /// 在单个事务中执行 body
    ///
    /// - body 成功: 提交
    /// - body 失败: 回滚并返回原错误
    /// - 超过执行上限: 回滚并返回 TransactionTimeout
    pub async fn run_in_transaction<T, F, Fut>(
        &self,
        options: &TransactionOptions,
        label: &str,
        body: F,
    ) -> RepositoryResult<T>
    where
        F: FnOnce(TxScope) -> Fut,
        Fut: Future<Output = RepositoryResult<T>>,
    {
        let scope = self.begin(options, label).await?;

        match tokio::time::timeout(options.timeout, body(scope.clone())).await {
            Ok(Ok(value)) => {
                scope.commit()?;
                Ok(value)
            }
            Ok(Err(err)) => {
                if let Err(rollback_err) = scope.rollback() {
                    warn!(label = label, error = %rollback_err, "回滚失败");
                }
                Err(err)
            }
            Err(_) => {
                if let Err(rollback_err) = scope.rollback() {
                    warn!(label = label, error = %rollback_err, "回滚失败");
                }
                Err(RepositoryError::TransactionTimeout {
                    label: label.to_string(),
                    elapsed_ms: scope.elapsed().as_millis() as u64,
                    limit_ms: options.timeout.as_millis() as u64,
                })
            }
        }
    }

    /// 在作用域（若有）或默认连接上执行读操作
    ///
    /// 无作用域时先取事务闸门，避免混入其他调用方打开中的事务
    pub(crate) async fn with_connection<T, F>(&self, scope: Option<&TxScope>, op: F) -> RepositoryResult<T>
    where
        F: FnOnce(&Connection) -> RepositoryResult<T> + Send,
        T: Send,
    {
        match scope {
            Some(scope) => {
                let conn = scope.connection()?;
                op(&*conn)
            }
            None => {
                let _permit = self.gate.lock().await;
                let conn = lock_connection(&self.conn)?;
                op(&*conn)
            }
        }
    }

    /// 执行写操作
    ///
    /// - 有作用域: 直接在作用域事务中执行
    /// - 无作用域: 自行包一个短事务（失败即回滚）
    pub(crate) async fn with_write<T, F>(&self, scope: Option<&TxScope>, op: F) -> RepositoryResult<T>
    where
        F: FnOnce(&Connection) -> RepositoryResult<T> + Send,
        T: Send,
    {
        match scope {
            Some(scope) => {
                let conn = scope.connection()?;
                op(&*conn)
            }
            None => {
                let _permit = self.gate.lock().await;
                let conn = lock_connection(&self.conn)?;
                let tx = conn.unchecked_transaction()?;
                let value = op(&*tx)?;
                tx.commit()?;
                Ok(value)
            }
        }
    }
}
