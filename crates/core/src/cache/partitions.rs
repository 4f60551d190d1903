//! Partition naming, versioning and lifecycle operations.
//!
//! A partition is a named bucket of cached responses scoped to one category
//! of content. Partition names embed a version tag so that a new release can
//! tell its own partitions apart from everything left behind by older ones.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// The category of content a partition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionPurpose {
    StaticAssets,
    DynamicPages,
    ApiResponses,
}

impl PartitionPurpose {
    pub const ALL: [PartitionPurpose; 3] =
        [PartitionPurpose::StaticAssets, PartitionPurpose::DynamicPages, PartitionPurpose::ApiResponses];

    /// Suffix appended to the version tag to form the partition name.
    pub fn suffix(self) -> &'static str {
        match self {
            PartitionPurpose::StaticAssets => "static",
            PartitionPurpose::DynamicPages => "dynamic",
            PartitionPurpose::ApiResponses => "api",
        }
    }
}

/// The set of partitions that belong to one cache version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSet {
    version_tag: String,
}

impl PartitionSet {
    /// Build the set for `{prefix}-{version}`, e.g. `edgecache-v1.2.0`.
    pub fn new(prefix: &str, version: &str) -> Self {
        Self { version_tag: format!("{prefix}-{version}") }
    }

    /// The version tag embedded in every partition name.
    pub fn version_tag(&self) -> &str {
        &self.version_tag
    }

    pub fn name(&self, purpose: PartitionPurpose) -> String {
        format!("{}-{}", self.version_tag, purpose.suffix())
    }

    /// All current partition names, static first.
    pub fn names(&self) -> Vec<String> {
        PartitionPurpose::ALL.iter().map(|p| self.name(*p)).collect()
    }

    /// Whether `name` is one of this version's partitions.
    pub fn contains(&self, name: &str) -> bool {
        PartitionPurpose::ALL.iter().any(|p| self.name(*p) == name)
    }
}

/// Occupancy of a single partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStats {
    pub name: String,
    pub entries: u64,
    pub bytes: u64,
}

impl CacheDb {
    /// Create the partition if it does not exist yet.
    pub async fn open_partition(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO partitions (name, created_at) VALUES (?1, ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Names of every existing partition, oldest first.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and everything in it.
    ///
    /// Returns false if no such partition existed.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE partition = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every partition.
    ///
    /// Returns the number of partitions removed.
    pub async fn clear_all(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries", [])?;
                let deleted = tx.execute("DELETE FROM partitions", [])?;
                tx.commit()?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry count and approximate body size of each partition, oldest first.
    pub async fn partition_stats(&self) -> Result<Vec<PartitionStats>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionStats>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, COUNT(e.key_hash), COALESCE(SUM(LENGTH(e.body)), 0)
                     FROM partitions p
                     LEFT JOIN entries e ON e.partition = p.name
                     GROUP BY p.name
                     ORDER BY p.rowid ASC",
                )?;
                let stats = stmt
                    .query_map([], |row| {
                        Ok(PartitionStats {
                            name: row.get(0)?,
                            entries: row.get::<_, i64>(1)? as u64,
                            bytes: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}
