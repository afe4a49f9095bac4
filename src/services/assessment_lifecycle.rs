//! Pure lifecycle rules for exams: schedule normalization, expiry, identifiers and
//! status derivation. Nothing here touches storage or the clock.

use thiserror::Error;
use time::{macros::format_description, Date, Duration, PrimitiveDateTime, Time, UtcOffset};
use uuid::Uuid;

use crate::db::models::Exam;
use crate::db::types::ExamStatus;

pub(crate) const ASSESSMENT_ID_LEN: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ScheduleError {
    #[error("invalid exam date: {0}")]
    InvalidDate(String),
    #[error("invalid exam time: {0}")]
    InvalidTime(String),
    #[error("invalid time limit: {0}")]
    InvalidTimeLimit(String),
    #[error("schedule out of range")]
    OutOfRange,
}

/// Strict `YYYY-MM-DD`. The `[year]` component alone would also take a leading sign.
pub(crate) fn parse_exam_date(raw: &str) -> Result<Date, ScheduleError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ScheduleError::InvalidDate(raw.to_string()));
    }
    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ScheduleError::InvalidDate(raw.to_string()))
}

/// Canonical `YYYY-MM-DD` as stored and echoed back.
pub(crate) fn format_exam_date(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

/// Canonical `HH:MM`, with `:SS` only when the seconds are set.
pub(crate) fn format_exam_time(time: Time) -> String {
    match time.second() {
        0 => format!("{:02}:{:02}", time.hour(), time.minute()),
        second => format!("{:02}:{:02}:{second:02}", time.hour(), time.minute()),
    }
}

/// `HH:MM`, or `HH:MM:SS` as some browsers submit it.
pub(crate) fn parse_exam_time(raw: &str) -> Result<Time, ScheduleError> {
    let trimmed = raw.trim();
    Time::parse(trimmed, format_description!("[hour]:[minute]"))
        .or_else(|_| Time::parse(trimmed, format_description!("[hour]:[minute]:[second]")))
        .map_err(|_| ScheduleError::InvalidTime(raw.to_string()))
}

/// Positive whole minutes. Accepts surrounding whitespace, nothing else.
pub(crate) fn parse_time_limit(raw: &str) -> Result<i32, ScheduleError> {
    match raw.trim().parse::<i32>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(ScheduleError::InvalidTimeLimit(raw.to_string())),
    }
}

/// Interprets the wall-clock `date` + `time` in `offset` and returns the naive UTC instant.
pub(crate) fn combine_schedule(
    date: Date,
    time: Time,
    offset: UtcOffset,
) -> Result<PrimitiveDateTime, ScheduleError> {
    let local = PrimitiveDateTime::new(date, time);
    let utc = local
        .checked_sub(Duration::seconds(offset.whole_seconds() as i64))
        .ok_or(ScheduleError::OutOfRange)?;
    Ok(utc)
}

pub(crate) fn compute_expiry(
    start: PrimitiveDateTime,
    duration_minutes: i32,
) -> Result<PrimitiveDateTime, ScheduleError> {
    start.checked_add(Duration::minutes(duration_minutes as i64)).ok_or(ScheduleError::OutOfRange)
}

/// First ten characters of a hyphenated v4 UUID. Uniqueness is enforced by the caller.
pub(crate) fn generate_assessment_id() -> String {
    let mut id = Uuid::new_v4().to_string();
    id.truncate(ASSESSMENT_ID_LEN);
    id
}

/// Derives the lifecycle status of `exam` at `now`.
///
/// Strict priority: a stored `Cancelled` is absorbing, then expiry, then the
/// in-progress window, then `Active`. The expiry instant itself counts as expired.
pub(crate) fn evaluate_status(exam: &Exam, now: PrimitiveDateTime) -> ExamStatus {
    match exam.exam_status {
        ExamStatus::Cancelled => ExamStatus::Cancelled,
        ExamStatus::Expired => ExamStatus::Expired,
        _ if now >= exam.expiry => ExamStatus::Expired,
        ExamStatus::InProgress => ExamStatus::InProgress,
        _ if exam.start_at <= now => ExamStatus::InProgress,
        ExamStatus::Active => ExamStatus::Active,
    }
}

/// Whether a read that derived `derived` must persist it over `stored`.
///
/// Only forward moves into `In Progress` or `Expired` are written, and a stored
/// `Cancelled` is never overwritten.
pub(crate) fn needs_write_back(stored: ExamStatus, derived: ExamStatus) -> bool {
    stored != derived
        && stored != ExamStatus::Cancelled
        && matches!(derived, ExamStatus::InProgress | ExamStatus::Expired)
}
