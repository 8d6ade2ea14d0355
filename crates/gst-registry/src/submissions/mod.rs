//! Persistence of confirmed registrations, keyed uniquely by GSTIN.
//!
//! Every backend declares the uniqueness constraint in its schema (or, for the
//! in-memory store, checks and inserts under one lock) so concurrent inserts
//! for the same GSTIN resolve to exactly one winner.

mod memory;
mod postgres;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{DatabaseConfig, StoreBackend};
use crate::gstin::Gstin;

pub use memory::InMemorySubmissionStore;
pub use postgres::PostgresSubmissionStore;
pub use sqlite::SqliteSubmissionStore;

/// A verified registration as written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub gstn: Gstin,
    pub legal_name: String,
    pub firm_name: String,
    pub name1: String,
    /// Empty when the form left it blank.
    pub name2: String,
    pub contact: String,
    pub created_at: DateTime<Utc>,
}

/// Storage capability shared by all backends.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    fn backend(&self) -> StoreBackend;

    /// Insert a new record, returning its key. Existing keys are rejected, never overwritten.
    async fn insert(&self, submission: Submission) -> Result<Gstin, StoreError>;

    async fn fetch(&self, gstn: &Gstin) -> Result<Option<Submission>, StoreError>;

    /// Liveness check against the backing store.
    async fn healthcheck(&self) -> Result<(), StoreError>;

    /// Apply pending schema migrations.
    async fn migrate(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("submission already exists")]
    Duplicate,
    #[error("submission store unavailable: {0}")]
    Unavailable(String),
    #[error("schema migration failed: {0}")]
    Migration(String),
}

/// Open the store selected by `backend`. Migrations are not applied here.
pub async fn connect(
    backend: StoreBackend,
    config: &DatabaseConfig,
) -> Result<Arc<dyn SubmissionStore>, StoreError> {
    let store: Arc<dyn SubmissionStore> = match backend {
        StoreBackend::Postgres => Arc::new(PostgresSubmissionStore::connect(config).await?),
        StoreBackend::Sqlite => Arc::new(SqliteSubmissionStore::connect(config).await?),
        StoreBackend::Memory => Arc::new(InMemorySubmissionStore::default()),
    };
    Ok(store)
}

#[derive(sqlx::FromRow)]
pub(crate) struct SubmissionRow {
    gstn: String,
    legal_name: String,
    firm_name: String,
    name1: String,
    name2: String,
    contact: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let gstn = Gstin::parse(&row.gstn).map_err(|err| {
            StoreError::Unavailable(format!("stored GSTIN '{}' is malformed: {err}", row.gstn))
        })?;
        Ok(Submission {
            gstn,
            legal_name: row.legal_name,
            firm_name: row.firm_name,
            name1: row.name1,
            name2: row.name2,
            contact: row.contact,
            created_at: row.created_at,
        })
    }
}

pub(crate) fn classify_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Unavailable(err.to_string()),
    }
}

pub(crate) fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}
