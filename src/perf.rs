// ==========================================
// 排放数据导入 - SQL 性能观测
// ==========================================
// - SQLite trace/profile 回调: 统计语句数、记录慢 SQL
// - PerfGuard: 记录一次操作的耗时 / 语句数 / 慢 SQL 数 / 处理记录数
// 说明: 计数器为进程级，导入流程串行执行，差值即为该操作的语句数
// ==========================================

use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub const ENV_PERF_SQL: &str = "EMISSIONS_IMPORT_PERF_SQL";
pub const ENV_SLOW_SQL_MS: &str = "EMISSIONS_IMPORT_SLOW_SQL_MS";

static PERF_SQL_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);
static SQL_COUNT: AtomicU64 = AtomicU64::new(0);
static SLOW_SQL_COUNT: AtomicU64 = AtomicU64::new(0);

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| {
        matches!(
            v.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn shorten_sql(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let head: String = flat.chars().take(max_chars).collect();
    format!("{}…", head)
}

/// 安装 SQLite 语句 trace/profile
///
/// 开关：
/// - Debug 默认开启；Release 默认关闭
/// - `EMISSIONS_IMPORT_PERF_SQL=1` 强制开启（`=0` 强制关闭）
/// - `EMISSIONS_IMPORT_SLOW_SQL_MS=50` 配置慢 SQL 阈值（毫秒）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = env_flag(ENV_PERF_SQL).unwrap_or(cfg!(debug_assertions));
    PERF_SQL_ENABLED.store(enabled, Ordering::Relaxed);

    if !enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    let slow_ms = std::env::var(ENV_SLOW_SQL_MS)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
    SLOW_SQL_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);

    conn.trace(Some(on_sql_trace));
    conn.profile(Some(on_sql_profile));
}

fn on_sql_trace(_sql: &str) {
    if PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        SQL_COUNT.fetch_add(1, Ordering::Relaxed);
    }
}

fn on_sql_profile(sql: &str, duration: Duration) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold > 0 && ms >= threshold {
        SLOW_SQL_COUNT.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            target: "slow_sql",
            duration_ms = ms,
            sql = %shorten_sql(sql, 400),
            "slow sql"
        );
    }
}

/// 性能统计 Guard：Drop 时输出一条 perf 日志
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    sql_start: u64,
    slow_sql_start: u64,
    records: Option<usize>,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            start: Instant::now(),
            sql_start: SQL_COUNT.load(Ordering::Relaxed),
            slow_sql_start: SLOW_SQL_COUNT.load(Ordering::Relaxed),
            records: None,
        }
    }

    /// 附带处理记录数（用于计算吞吐）
    pub fn with_records(mut self, records: usize) -> Self {
        self.records = Some(records);
        self
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let sql_count = SQL_COUNT.load(Ordering::Relaxed).saturating_sub(self.sql_start);
        let slow_sql_count = SLOW_SQL_COUNT
            .load(Ordering::Relaxed)
            .saturating_sub(self.slow_sql_start);
        let records_per_sec = self.records.map(|n| {
            let secs = elapsed.as_secs_f64();
            if secs > 0.0 {
                (n as f64 / secs).round() as u64
            } else {
                n as u64
            }
        });

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = elapsed.as_millis() as u64,
            sql_count,
            slow_sql_count,
            records = self.records,
            records_per_sec,
            "done"
        );
    }
}
