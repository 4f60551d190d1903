//! Partition store schema migrations.
//!
//! Applied versions are recorded in `_migrations`; opening a store brings it
//! up to [`SCHEMA_VERSION`] and reports what it found and what it applied.

use super::Error;
use tokio_rusqlite::{Connection, params};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Migrations in application order. Each is idempotent (`IF NOT EXISTS`).
const MIGRATIONS: &[Migration] =
    &[Migration { version: 1, name: "partitions", sql: include_str!("../../migrations/001_partitions.sql") }];

/// Schema version a fully migrated partition store is at.
pub const SCHEMA_VERSION: i64 = 1;

/// Outcome of bringing a store up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaReport {
    /// Version the store was at when opened; 0 for a fresh store.
    pub found: i64,
    /// Version after migrating.
    pub current: i64,
}

impl SchemaReport {
    pub fn applied(&self) -> i64 {
        self.current - self.found
    }
}

/// Apply every migration newer than the store's recorded version.
///
/// A store recorded at a newer version than this build knows is refused
/// rather than written with an older layout.
pub async fn run(conn: &Connection) -> Result<SchemaReport, Error> {
    let report = conn
        .call(|conn| -> Result<SchemaReport, Error> {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS _migrations (
                    version INTEGER PRIMARY KEY,
                    name TEXT NOT NULL DEFAULT '',
                    applied_at TEXT NOT NULL
                )",
                [],
            )?;

            let found: i64 =
                conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

            if found > SCHEMA_VERSION {
                return Err(Error::MigrationFailed(format!(
                    "partition store is at schema version {found}, newer than supported version {SCHEMA_VERSION}"
                )));
            }

            let tx = conn.transaction()?;
            for migration in MIGRATIONS.iter().filter(|m| m.version > found) {
                tx.execute_batch(migration.sql)
                    .map_err(|e| Error::MigrationFailed(format!("{} (v{}): {}", migration.name, migration.version, e)))?;
                tx.execute(
                    "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                    params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
                )?;
            }
            tx.commit()?;

            Ok(SchemaReport { found, current: SCHEMA_VERSION })
        })
        .await?;

    if report.applied() > 0 {
        tracing::info!(from = report.found, to = report.current, "migrated partition store schema");
    } else {
        tracing::debug!(version = report.current, "partition store schema up to date");
    }

    Ok(report)
}
