//! In-process migration log.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::log::{MigrationLog, MigrationRecord};
use crate::error::Result;
use crate::session::SchemaSession;

/// Keeps records in memory; history is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryMigrationLog {
    records: Mutex<Vec<MigrationRecord>>,
}

impl MemoryMigrationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with ids that count as already applied.
    pub fn with_applied<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = ids
            .into_iter()
            .map(|id| MigrationRecord::success(id, ""))
            .collect();
        Self {
            records: Mutex::new(records),
        }
    }

    /// Snapshot of every record, in insertion order.
    pub async fn records(&self) -> Vec<MigrationRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl MigrationLog for MemoryMigrationLog {
    async fn init(&self, _session: &SchemaSession) -> Result<()> {
        Ok(())
    }

    async fn applied_ids(&self, _session: &SchemaSession) -> Result<Vec<String>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|r| r.success)
            .map(|r| r.migration_id.clone())
            .collect())
    }

    async fn record(&self, _session: &SchemaSession, record: &MigrationRecord) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
