//! Persistence seam for the assessment core.
//!
//! Handlers and services only see [`Store`]; the Postgres implementation delegates to
//! the per-table query modules.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::db::models::{Account, Exam};
use crate::db::types::ExamStatus;
use crate::repositories::accounts::{self, CreateAccount};
use crate::repositories::exams::{self, CreateExam};

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name when known.
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Database(err)
    }
}

pub(crate) type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub(crate) trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    async fn find_account(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn create_account(&self, params: CreateAccount<'_>) -> StoreResult<Account>;

    async fn assessment_id_exists(&self, assessment_id: &str) -> StoreResult<bool>;

    async fn create_exam(&self, params: CreateExam<'_>) -> StoreResult<Exam>;

    async fn find_exam(&self, assessment_id: &str) -> StoreResult<Option<Exam>>;

    /// Exams owned by `owner`, newest creation first.
    async fn list_exams_by_owner(&self, owner: &str) -> StoreResult<Vec<Exam>>;

    async fn update_exam_status(&self, id: i64, status: ExamStatus) -> StoreResult<()>;
}

#[derive(Clone)]
pub(crate) struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_account(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(accounts::find_by_email(&self.pool, email).await?)
    }

    async fn create_account(&self, params: CreateAccount<'_>) -> StoreResult<Account> {
        Ok(accounts::create(&self.pool, params).await?)
    }

    async fn assessment_id_exists(&self, assessment_id: &str) -> StoreResult<bool> {
        Ok(exams::assessment_id_exists(&self.pool, assessment_id).await?)
    }

    async fn create_exam(&self, params: CreateExam<'_>) -> StoreResult<Exam> {
        Ok(exams::create(&self.pool, params).await?)
    }

    async fn find_exam(&self, assessment_id: &str) -> StoreResult<Option<Exam>> {
        Ok(exams::find_by_assessment_id(&self.pool, assessment_id).await?)
    }

    async fn list_exams_by_owner(&self, owner: &str) -> StoreResult<Vec<Exam>> {
        Ok(exams::list_by_owner(&self.pool, owner).await?)
    }

    async fn update_exam_status(&self, id: i64, status: ExamStatus) -> StoreResult<()> {
        Ok(exams::update_status(&self.pool, id, status).await?)
    }
}
