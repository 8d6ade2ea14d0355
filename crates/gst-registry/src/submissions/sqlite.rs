use std::str::FromStr;

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use super::{
    classify_write_error, unavailable, StoreError, Submission, SubmissionRow, SubmissionStore,
};
use crate::config::{DatabaseConfig, StoreBackend};
use crate::gstin::Gstin;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations/sqlite");

/// Submission store backed by a SQLite file (or in-memory database).
#[derive(Clone)]
pub struct SqliteSubmissionStore {
    pool: SqlitePool,
}

impl SqliteSubmissionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .require_url()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let options = SqliteConnectOptions::from_str(url)
            .map_err(unavailable)?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout);
        // each connection to an in-memory URL is its own database, and closing
        // the last one drops it
        if is_in_memory(url) {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let max_connections = pool_options.get_max_connections();

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(unavailable)?;

        info!(max_connections, "opened sqlite submission store");
        Ok(Self::new(pool))
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[async_trait]
impl SubmissionStore for SqliteSubmissionStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Sqlite
    }

    #[tracing::instrument(skip_all, fields(db.table = "submissions", db.operation = "insert", gstn = %submission.gstn))]
    async fn insert(&self, submission: Submission) -> Result<Gstin, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO submissions (gstn, legal_name, firm_name, name1, name2, contact, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(submission.gstn.as_str())
        .bind(&submission.legal_name)
        .bind(&submission.firm_name)
        .bind(&submission.name1)
        .bind(&submission.name2)
        .bind(&submission.contact)
        .bind(submission.created_at)
        .execute(&self.pool)
        .await
        .map_err(classify_write_error)?;

        Ok(submission.gstn)
    }

    #[tracing::instrument(skip(self), fields(db.table = "submissions", db.operation = "select"))]
    async fn fetch(&self, gstn: &Gstin) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            "SELECT gstn, legal_name, firm_name, name1, name2, contact, created_at FROM submissions WHERE gstn = ?",
        )
        .bind(gstn.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(Submission::try_from).transpose()
    }

    async fn healthcheck(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|err| StoreError::Migration(err.to_string()))
    }
}
