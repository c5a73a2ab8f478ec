use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS generation_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    kind TEXT NOT NULL,
    latency_ms INTEGER NOT NULL,
    success INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_generation_log_timestamp ON generation_log(timestamp);
"#;

/// Which generation entry point a call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Text,
    Structured,
}

impl CallKind {
    fn as_str(self) -> &'static str {
        match self {
            CallKind::Text => "text",
            CallKind::Structured => "structured",
        }
    }
}

/// Local log of generation-service calls.
pub struct MetricsStore {
    conn: Mutex<Connection>,
}

impl MetricsStore {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "auto_vacuum", "INCREMENTAL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn record(&self, kind: CallKind, latency_ms: u64, success: bool) {
        let Ok(conn) = self.conn.lock() else {
            return;
        };
        if let Err(e) = conn.execute(
            "INSERT INTO generation_log (timestamp, kind, latency_ms, success)
             VALUES (datetime('now'), ?1, ?2, ?3)",
            params![kind.as_str(), latency_ms as i64, success as i32],
        ) {
            tracing::debug!(error = %e, "failed to record generation metrics");
        }
    }

    pub fn get_summary(&self, retention_days: u32) -> MetricsSummary {
        let Ok(conn) = self.conn.lock() else {
            return MetricsSummary::default();
        };
        let query = format!(
            r#"
            SELECT
                COUNT(*) as total_calls,
                COALESCE(SUM(CASE WHEN kind = 'structured' THEN 1 ELSE 0 END), 0) as structured_calls,
                COALESCE(AVG(latency_ms), 0) as avg_latency_ms,
                COALESCE(SUM(CASE WHEN success = 0 THEN 1 ELSE 0 END) * 100.0 / NULLIF(COUNT(*), 0), 0) as error_rate
            FROM generation_log
            WHERE timestamp >= datetime('now', '-{} days')
            "#,
            retention_days
        );

        conn.query_row(&query, [], |row| {
            Ok(MetricsSummary {
                total_calls: row.get::<_, i64>(0)? as u64,
                structured_calls: row.get::<_, i64>(1)? as u64,
                avg_latency_ms: row.get::<_, f64>(2)? as u64,
                error_rate: row.get::<_, f64>(3)? as f32,
            })
        })
        .unwrap_or_default()
    }

    pub fn cleanup(&self, retention_days: u32) {
        let Ok(conn) = self.conn.lock() else {
            return;
        };
        let query = format!(
            "DELETE FROM generation_log WHERE timestamp < datetime('now', '-{} days')",
            retention_days
        );
        let _ = conn.execute(&query, []);
    }
}

#[cfg(test)]
impl MetricsStore {
    /// Shift every recorded call `days` into the past.
    pub(crate) fn backdate(&self, days: u32) {
        if let Ok(conn) = self.conn.lock() {
            let query = format!(
                "UPDATE generation_log SET timestamp = datetime(timestamp, '-{} days')",
                days
            );
            let _ = conn.execute(&query, []);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_calls: u64,
    pub structured_calls: u64,
    pub avg_latency_ms: u64,
    pub error_rate: f32,
}
