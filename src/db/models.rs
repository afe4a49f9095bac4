use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::ExamStatus;

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Account {
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) hashed_password: String,
    pub(crate) created_at: PrimitiveDateTime,
}

/// One row of `exams`. All instants are naive UTC.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: i64,
    pub(crate) assessment_id: String,
    pub(crate) title: String,
    pub(crate) exam_date: String,
    pub(crate) exam_time: String,
    pub(crate) duration_minutes: i32,
    pub(crate) start_at: PrimitiveDateTime,
    pub(crate) expiry: PrimitiveDateTime,
    pub(crate) created_by: String,
    pub(crate) file_status: String,
    pub(crate) exam_status: ExamStatus,
    pub(crate) created_date: PrimitiveDateTime,
}
