use std::str::FromStr;

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

use super::{
    classify_write_error, unavailable, StoreError, Submission, SubmissionRow, SubmissionStore,
};
use crate::config::{DatabaseConfig, StoreBackend};
use crate::gstin::Gstin;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations/postgres");

/// Submission store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PostgresSubmissionStore {
    pool: PgPool,
}

impl PostgresSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .require_url()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let options = PgConnectOptions::from_str(url)
            .map_err(unavailable)?
            .options([("search_path", config.schema.as_str())]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(unavailable)?;

        info!(
            schema = %config.schema,
            max_connections = config.max_connections,
            "connected to postgres submission store"
        );
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SubmissionStore for PostgresSubmissionStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Postgres
    }

    #[tracing::instrument(skip_all, fields(db.table = "submissions", db.operation = "insert", gstn = %submission.gstn))]
    async fn insert(&self, submission: Submission) -> Result<Gstin, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO submissions (gstn, legal_name, firm_name, name1, name2, contact, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
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
            "SELECT gstn, legal_name, firm_name, name1, name2, contact, created_at FROM submissions WHERE gstn = $1",
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
