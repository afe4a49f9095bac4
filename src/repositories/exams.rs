use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Exam;
use crate::db::types::ExamStatus;

const COLUMNS: &str = "\
    id, assessment_id, title, exam_date, exam_time, duration_minutes, \
    start_at, expiry, created_by, file_status, exam_status, created_date";

pub(crate) struct CreateExam<'a> {
    pub assessment_id: &'a str,
    pub title: &'a str,
    pub exam_date: &'a str,
    pub exam_time: &'a str,
    pub duration_minutes: i32,
    pub start_at: PrimitiveDateTime,
    pub expiry: PrimitiveDateTime,
    pub created_by: &'a str,
    pub file_status: &'a str,
    pub exam_status: ExamStatus,
    pub created_date: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            assessment_id, title, exam_date, exam_time, duration_minutes,
            start_at, expiry, created_by, file_status, exam_status, created_date
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.assessment_id)
    .bind(params.title)
    .bind(params.exam_date)
    .bind(params.exam_time)
    .bind(params.duration_minutes)
    .bind(params.start_at)
    .bind(params.expiry)
    .bind(params.created_by)
    .bind(params.file_status)
    .bind(params.exam_status)
    .bind(params.created_date)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_assessment_id(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE assessment_id = $1"))
        .bind(assessment_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn assessment_id_exists(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM exams WHERE assessment_id = $1)")
        .bind(assessment_id)
        .fetch_one(pool)
        .await
}

/// Newest first; ties broken by insertion order so the listing is stable.
pub(crate) async fn list_by_owner(pool: &PgPool, owner: &str) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams
         WHERE created_by = $1
         ORDER BY created_date DESC, id DESC"
    ))
    .bind(owner)
    .fetch_all(pool)
    .await
}

/// Unconditional overwrite; concurrent readers converge on the same derived value.
pub(crate) async fn update_status(
    pool: &PgPool,
    id: i64,
    status: ExamStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE exams SET exam_status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
