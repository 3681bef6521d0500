//! In-memory `SchemaConnection` for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::traits::SchemaConnection;
use crate::error::DbError;

/// Records every call. Catalog queries answer `true` when their parameter
/// list was registered with [`MockConnection::with_existing`].
#[derive(Default)]
pub(crate) struct MockConnection {
    executed: Mutex<Vec<String>>,
    queries: Mutex<Vec<(String, Vec<String>)>>,
    existing: Mutex<HashSet<Vec<String>>>,
    rows: Vec<String>,
    fail_on: Vec<(String, DbError)>,
    query_error: Option<DbError>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(self, params: &[&str]) -> Self {
        self.mark_existing(params);
        self
    }

    pub fn mark_existing(&self, params: &[&str]) {
        let key = params.iter().map(|p| p.to_string()).collect();
        self.existing.lock().unwrap().insert(key);
    }

    /// Rows returned by `query_strings`.
    pub fn with_rows(mut self, rows: &[&str]) -> Self {
        self.rows = rows.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Fail any executed statement containing `needle`.
    pub fn failing_on(mut self, needle: &str, err: DbError) -> Self {
        self.fail_on.push((needle.to_string(), err));
        self
    }

    /// Fail every catalog query.
    pub fn failing_queries(mut self, err: DbError) -> Self {
        self.query_error = Some(err);
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<(String, Vec<String>)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchemaConnection for MockConnection {
    async fn execute(&self, sql: &str) -> Result<u64, DbError> {
        if let Some((_, err)) = self.fail_on.iter().find(|(needle, _)| sql.contains(needle)) {
            return Err(err.clone());
        }
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(0)
    }

    async fn query_exists(&self, sql: &str, params: &[String]) -> Result<bool, DbError> {
        self.queries
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if let Some(err) = &self.query_error {
            return Err(err.clone());
        }
        Ok(self.existing.lock().unwrap().contains(params))
    }

    async fn query_strings(&self, sql: &str, params: &[String]) -> Result<Vec<String>, DbError> {
        self.queries
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if let Some(err) = &self.query_error {
            return Err(err.clone());
        }
        Ok(self.rows.clone())
    }

    fn driver_name(&self) -> &str {
        "mock"
    }
}
