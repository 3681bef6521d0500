//! Sequential migration runner.
//!
//! Steps run strictly in registration order on one session. Each step is
//! checked against the log, then its condition, then rendered and executed.
//! The first failure stops the run; steps after it are never attempted.

mod log;
mod memory;

pub use log::{DbMigrationLog, MigrationLog, MigrationRecord};
pub use memory::MemoryMigrationLog;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{MigrateError, Result};
use crate::migration::Migration;
use crate::session::SchemaSession;

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Steps executed in this run.
    pub applied: usize,
    /// Steps whose condition did not hold.
    pub skipped: usize,
    /// Steps found in the log from an earlier run.
    pub already_applied: usize,
    pub duration_seconds: f64,
}

pub struct Migrator {
    session: SchemaSession,
    log: Arc<dyn MigrationLog>,
    migrations: Vec<Box<dyn Migration>>,
}

impl Migrator {
    pub fn new(session: SchemaSession, log: Arc<dyn MigrationLog>) -> Self {
        Self {
            session,
            log,
            migrations: Vec::new(),
        }
    }

    pub fn session(&self) -> &SchemaSession {
        &self.session
    }

    /// Register a step under `id`. Ids must be non-empty and unique.
    pub fn add_migration<M>(&mut self, id: impl Into<String>, migration: M) -> Result<()>
    where
        M: Migration + 'static,
    {
        self.add_boxed(id, Box::new(migration))
    }

    /// Register an already boxed step, e.g. one loaded from a migration file.
    pub fn add_boxed(
        &mut self,
        id: impl Into<String>,
        mut migration: Box<dyn Migration>,
    ) -> Result<()> {
        let id = id.into();
        if id.is_empty() {
            return Err(MigrateError::Config("migration id must not be empty".into()));
        }
        if self.migrations.iter().any(|m| m.id() == id) {
            return Err(MigrateError::Config(format!(
                "duplicate migration id '{}'",
                id
            )));
        }
        migration.set_id(id);
        self.migrations.push(migration);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Registered ids, in run order.
    pub fn ids(&self) -> Vec<&str> {
        self.migrations.iter().map(|m| m.id()).collect()
    }

    /// Every step rendered for the session's dialect, without touching the
    /// database.
    pub fn render_plan(&self) -> Vec<(String, String)> {
        let dialect = self.session.dialect();
        self.migrations
            .iter()
            .map(|m| (m.id().to_string(), m.sql(dialect)))
            .collect()
    }

    /// Apply every pending step.
    ///
    /// `cancel` is checked before each step; a step already executing is
    /// never interrupted.
    pub async fn run(&self, cancel: Option<&CancellationToken>) -> Result<RunSummary> {
        let started = Instant::now();
        info!(
            "Starting migration run: {} steps on {} (log: {})",
            self.migrations.len(),
            self.session.dialect_name(),
            self.log.backend_type()
        );

        self.log.init(&self.session).await?;
        let applied: HashSet<String> = self
            .log
            .applied_ids(&self.session)
            .await?
            .into_iter()
            .collect();

        let mut summary = RunSummary::default();
        for migration in &self.migrations {
            let id = migration.id();

            if cancel.is_some_and(|c| c.is_cancelled()) {
                warn!("Cancellation requested, stopping before {}", id);
                return Err(MigrateError::Cancelled(id.to_string()));
            }

            if applied.contains(id) {
                debug!("{}: already applied", id);
                summary.already_applied += 1;
                continue;
            }

            if let Some(condition) = migration.condition() {
                let holds = condition
                    .evaluate(&self.session)
                    .await
                    .map_err(|source| MigrateError::Condition {
                        id: id.to_string(),
                        source,
                    })?;
                if !holds {
                    debug!("{}: condition not met, skipping", id);
                    self.log
                        .record(&self.session, &MigrationRecord::success(id, ""))
                        .await?;
                    summary.skipped += 1;
                    continue;
                }
            }

            let sql = migration.sql(self.session.dialect());
            match self.session.execute(&sql).await {
                Ok(_) => {
                    self.log
                        .record(&self.session, &MigrationRecord::success(id, sql.as_str()))
                        .await?;
                    info!("{}: applied", id);
                    summary.applied += 1;
                }
                Err(e) => {
                    error!("{}: failed - {}", id, e);
                    let record = MigrationRecord::failure(id, sql.as_str(), &e);
                    if let Err(log_err) = self.log.record(&self.session, &record).await {
                        warn!("{}: could not record failure: {}", id, log_err);
                    }
                    return Err(MigrateError::execution(
                        id,
                        self.session.dialect_name(),
                        sql,
                        e,
                    ));
                }
            }
        }

        summary.duration_seconds = started.elapsed().as_secs_f64();
        info!(
            "Migration run complete: {} applied, {} skipped, {} already applied in {:.2}s",
            summary.applied, summary.skipped, summary.already_applied, summary.duration_seconds
        );
        Ok(summary)
    }
}
