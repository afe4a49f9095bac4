use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use time::UtcOffset;
use validator::Validate;

use crate::core::time::format_in_offset;
use crate::db::models::Exam;
use crate::db::types::ExamStatus;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateExamRequest {
    #[serde(default)]
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) exam_date: Option<String>,
    #[serde(default)]
    pub(crate) exam_time: Option<String>,
    #[serde(default, deserialize_with = "string_or_integer")]
    pub(crate) time_limit: Option<String>,
}

/// Form posts send `time_limit` as a string, API clients as a number.
fn string_or_integer<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(value)) => Ok(Some(value)),
        Some(serde_json::Value::Number(value)) => Ok(Some(value.to_string())),
        Some(other) => {
            Err(de::Error::custom(format!("time_limit must be a string or integer, got {other}")))
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateExamResponse {
    pub(crate) success: bool,
    pub(crate) assessment_id: String,
    pub(crate) expiry: String,
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    #[serde(default, rename = "assessmentId", alias = "assessment_id")]
    pub(crate) assessment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyResponse {
    pub(crate) status: &'static str,
    pub(crate) message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExamView {
    pub(crate) assessment_id: String,
    pub(crate) title: String,
    pub(crate) date: String,
    pub(crate) time: String,
    pub(crate) duration: i32,
    pub(crate) created_date: String,
    pub(crate) expiry: String,
    pub(crate) file_status: String,
    pub(crate) status: ExamStatus,
}

impl ExamView {
    /// Projects a reconciled exam; `status` is whatever the caller resolved for this read.
    pub(crate) fn from_db(exam: Exam, status: ExamStatus, offset: UtcOffset) -> Self {
        Self {
            assessment_id: exam.assessment_id,
            title: exam.title,
            date: exam.exam_date,
            time: exam.exam_time,
            duration: exam.duration_minutes,
            created_date: format_in_offset(exam.created_date, offset),
            expiry: format_in_offset(exam.expiry, offset),
            file_status: exam.file_status,
            status,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentListResponse {
    pub(crate) status: &'static str,
    pub(crate) assessments: Vec<ExamView>,
}
