//! Assessment Lifecycle Manager: create, verify and list exams over a [`Store`].
//!
//! Status is reconciled lazily. Every read derives the status at `now` and writes
//! it back when it moved forward.

use thiserror::Error;
use time::{PrimitiveDateTime, UtcOffset};

use crate::core::metrics;
use crate::db::models::Exam;
use crate::db::types::{ExamStatus, FILE_STATUS_NOT_UPLOADED};
use crate::repositories::exams::CreateExam;
use crate::repositories::store::{Store, StoreError};
use crate::schemas::assessment::ExamView;
use crate::schemas::required;
use crate::services::assessment_lifecycle::{
    combine_schedule, compute_expiry, evaluate_status, format_exam_date, format_exam_time,
    generate_assessment_id, needs_write_back, parse_exam_date, parse_exam_time, parse_time_limit,
};

const MAX_ID_ATTEMPTS: usize = 5;

pub(crate) const MSG_FIELDS_REQUIRED: &str = "All fields are required!";
pub(crate) const MSG_INVALID_DETAILS: &str =
    "Invalid assessment details! Use YYYY-MM-DD, HH:MM and a positive time limit.";
pub(crate) const MSG_PAST_SCHEDULE: &str = "You cannot create an assessment in the past!";

#[derive(Debug, Error)]
pub(crate) enum LifecycleError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("exam start is in the past")]
    PastSchedule,
    #[error("could not allocate a unique assessment id")]
    IdSpaceExhausted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Raw creation input as submitted; nothing is trusted yet.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct NewAssessment<'a> {
    pub(crate) title: Option<&'a str>,
    pub(crate) exam_date: Option<&'a str>,
    pub(crate) exam_time: Option<&'a str>,
    pub(crate) time_limit: Option<&'a str>,
}

pub(crate) async fn create(
    store: &dyn Store,
    owner: &str,
    input: NewAssessment<'_>,
    now: PrimitiveDateTime,
    offset: UtcOffset,
) -> Result<Exam, LifecycleError> {
    let (Some(title), Some(exam_date), Some(exam_time), Some(time_limit)) = (
        required(input.title),
        required(input.exam_date),
        required(input.exam_time),
        required(input.time_limit),
    ) else {
        return Err(LifecycleError::Validation(MSG_FIELDS_REQUIRED));
    };

    let invalid = |_| LifecycleError::Validation(MSG_INVALID_DETAILS);
    let date = parse_exam_date(exam_date).map_err(invalid)?;
    let time = parse_exam_time(exam_time).map_err(invalid)?;
    let duration_minutes = parse_time_limit(time_limit).map_err(invalid)?;
    let start_at = combine_schedule(date, time, offset).map_err(invalid)?;

    if start_at < now {
        return Err(LifecycleError::PastSchedule);
    }

    let expiry = compute_expiry(start_at, duration_minutes).map_err(invalid)?;
    let exam_date = format_exam_date(date);
    let exam_time = format_exam_time(time);

    for attempt in 1..=MAX_ID_ATTEMPTS {
        let assessment_id = generate_assessment_id();
        if store.assessment_id_exists(&assessment_id).await? {
            tracing::warn!(assessment_id = %assessment_id, attempt, "Assessment id already taken");
            continue;
        }

        let params = CreateExam {
            assessment_id: &assessment_id,
            title,
            exam_date: &exam_date,
            exam_time: &exam_time,
            duration_minutes,
            start_at,
            expiry,
            created_by: owner,
            file_status: FILE_STATUS_NOT_UPLOADED,
            exam_status: ExamStatus::Active,
            created_date: now,
        };

        match store.create_exam(params).await {
            Ok(exam) => {
                tracing::info!(
                    assessment_id = %exam.assessment_id,
                    owner = %owner,
                    start_at = %exam.start_at,
                    expiry = %exam.expiry,
                    "Assessment created"
                );
                metrics::record_assessment_created();
                return Ok(exam);
            }
            Err(StoreError::Conflict(constraint)) => {
                tracing::warn!(
                    assessment_id = %assessment_id,
                    attempt,
                    constraint = %constraint,
                    "Assessment id collided on insert"
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(LifecycleError::IdSpaceExhausted)
}

/// Outcome of a public assessment-id lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verification {
    NotFound,
    Cancelled,
    Expired,
    InProgress,
    Valid,
}

impl Verification {
    pub(crate) fn tag(self) -> &'static str {
        match self {
            Self::NotFound => "error",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::InProgress => "in_progress",
            Self::Valid => "valid",
        }
    }

    pub(crate) fn message(self) -> &'static str {
        match self {
            Self::NotFound => "Invalid Assessment ID",
            Self::Cancelled => "Assessment has been cancelled",
            Self::Expired => "Assessment has expired",
            Self::InProgress => "Assessment is currently in progress. You can take the test.",
            Self::Valid => "Valid Assessment ID. Test not yet started.",
        }
    }

    fn from_status(status: ExamStatus) -> Self {
        match status {
            ExamStatus::Cancelled => Self::Cancelled,
            ExamStatus::Expired => Self::Expired,
            ExamStatus::InProgress => Self::InProgress,
            ExamStatus::Active => Self::Valid,
        }
    }
}

pub(crate) async fn verify(
    store: &dyn Store,
    assessment_id: &str,
    now: PrimitiveDateTime,
) -> Result<Verification, LifecycleError> {
    let assessment_id = assessment_id.trim();
    if assessment_id.is_empty() {
        return Ok(Verification::NotFound);
    }

    let Some(exam) = store.find_exam(assessment_id).await? else {
        tracing::debug!(assessment_id = %assessment_id, "Unknown assessment id");
        return Ok(Verification::NotFound);
    };

    let status = reconcile(store, &exam, now).await?;
    Ok(Verification::from_status(status))
}

pub(crate) async fn list_for_owner(
    store: &dyn Store,
    owner: &str,
    now: PrimitiveDateTime,
    offset: UtcOffset,
) -> Result<Vec<ExamView>, LifecycleError> {
    let exams = store.list_exams_by_owner(owner).await?;
    let mut views = Vec::with_capacity(exams.len());
    for exam in exams {
        let status = reconcile(store, &exam, now).await?;
        views.push(ExamView::from_db(exam, status, offset));
    }
    Ok(views)
}

/// Derives the status at `now` and persists it when it moved forward.
async fn reconcile(
    store: &dyn Store,
    exam: &Exam,
    now: PrimitiveDateTime,
) -> Result<ExamStatus, LifecycleError> {
    let derived = evaluate_status(exam, now);
    if needs_write_back(exam.exam_status, derived) {
        store.update_exam_status(exam.id, derived).await?;
        tracing::info!(
            assessment_id = %exam.assessment_id,
            from = %exam.exam_status,
            to = %derived,
            "Assessment status updated"
        );
        metrics::record_status_transition(derived);
    }
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_exam, MemoryStore};
    use time::macros::datetime;
    use time::Duration;

    const OWNER: &str = "teacher@example.com";

    fn input<'a>(date: &'a str, time: &'a str, limit: &'a str) -> NewAssessment<'a> {
        NewAssessment {
            title: Some("Algebra midterm"),
            exam_date: Some(date),
            exam_time: Some(time),
            time_limit: Some(limit),
        }
    }

    #[tokio::test]
    async fn create_schedules_exam_with_expiry() {
        let store = MemoryStore::default();
        let now = datetime!(2098-06-01 12:00);

        let exam = create(&store, OWNER, input("2099-01-01", "10:00", "30"), now, UtcOffset::UTC)
            .await
            .expect("create exam");

        assert_eq!(exam.assessment_id.len(), 10);
        assert_eq!(exam.start_at, datetime!(2099-01-01 10:00));
        assert_eq!(exam.expiry, datetime!(2099-01-01 10:30));
        assert_eq!(exam.exam_status, ExamStatus::Active);
        assert_eq!(exam.file_status, FILE_STATUS_NOT_UPLOADED);
        assert_eq!(exam.created_by, OWNER);
        assert_eq!(exam.created_date, now);
        assert_eq!(store.exam_count().await, 1);
    }

    #[tokio::test]
    async fn create_interprets_schedule_in_configured_offset() {
        let store = MemoryStore::default();
        let offset = UtcOffset::from_hms(3, 0, 0).unwrap();

        let exam = create(
            &store,
            OWNER,
            input("2099-01-01", "10:00", "45"),
            datetime!(2098-06-01 12:00),
            offset,
        )
        .await
        .expect("create exam");

        assert_eq!(exam.start_at, datetime!(2099-01-01 07:00));
        assert_eq!(exam.expiry, datetime!(2099-01-01 07:45));
    }

    #[tokio::test]
    async fn create_rejects_past_schedule_without_writing() {
        let store = MemoryStore::default();

        let err = create(
            &store,
            OWNER,
            input("2000-01-01", "10:00", "30"),
            datetime!(2098-06-01 12:00),
            UtcOffset::UTC,
        )
        .await
        .expect_err("past schedule");

        assert!(matches!(err, LifecycleError::PastSchedule));
        assert_eq!(store.exam_count().await, 0);
    }

    #[tokio::test]
    async fn create_accepts_start_equal_to_now() {
        let store = MemoryStore::default();
        let now = datetime!(2099-01-01 10:00);

        let exam = create(&store, OWNER, input("2099-01-01", "10:00", "30"), now, UtcOffset::UTC)
            .await
            .expect("start == now is allowed");

        assert_eq!(exam.start_at, now);
    }

    #[tokio::test]
    async fn create_requires_every_field() {
        let store = MemoryStore::default();
        let now = datetime!(2098-06-01 12:00);

        let mut missing_title = input("2099-01-01", "10:00", "30");
        missing_title.title = Some("   ");
        let mut missing_limit = input("2099-01-01", "10:00", "30");
        missing_limit.time_limit = None;

        for candidate in [missing_title, missing_limit, NewAssessment::default()] {
            let err = create(&store, OWNER, candidate, now, UtcOffset::UTC)
                .await
                .expect_err("missing field");
            assert!(matches!(err, LifecycleError::Validation(MSG_FIELDS_REQUIRED)));
        }
        assert_eq!(store.exam_count().await, 0);
    }

    #[tokio::test]
    async fn create_rejects_malformed_fields() {
        let store = MemoryStore::default();
        let now = datetime!(2098-06-01 12:00);

        for candidate in [
            input("01/01/2099", "10:00", "30"),
            input("2099-01-01", "10am", "30"),
            input("2099-01-01", "10:00", "0"),
            input("2099-01-01", "10:00", "-30"),
            input("2099-01-01", "10:00", "half an hour"),
            input("+2099-01-01", "10:00", "30"),
        ] {
            let err = create(&store, OWNER, candidate, now, UtcOffset::UTC)
                .await
                .expect_err("malformed input");
            assert!(matches!(err, LifecycleError::Validation(MSG_INVALID_DETAILS)));
        }
        assert_eq!(store.exam_count().await, 0);
    }

    #[tokio::test]
    async fn create_stores_canonical_schedule_text() {
        let store = MemoryStore::default();

        let exam = create(
            &store,
            OWNER,
            input(" 2099-01-01 ", "09:05:00", "30"),
            datetime!(2098-06-01 12:00),
            UtcOffset::UTC,
        )
        .await
        .expect("create exam");

        assert_eq!(exam.exam_date, "2099-01-01");
        assert_eq!(exam.exam_time, "09:05");
        assert_eq!(exam.start_at, datetime!(2099-01-01 09:05));
    }

    #[tokio::test]
    async fn create_gives_up_after_repeated_id_collisions() {
        let store = MemoryStore::default();
        store.fail_inserts_with_conflict(MAX_ID_ATTEMPTS).await;

        let err = create(
            &store,
            OWNER,
            input("2099-01-01", "10:00", "30"),
            datetime!(2098-06-01 12:00),
            UtcOffset::UTC,
        )
        .await
        .expect_err("ids exhausted");

        assert!(matches!(err, LifecycleError::IdSpaceExhausted));
        assert_eq!(store.exam_count().await, 0);
    }

    #[tokio::test]
    async fn create_retries_after_single_collision() {
        let store = MemoryStore::default();
        store.fail_inserts_with_conflict(1).await;

        let exam = create(
            &store,
            OWNER,
            input("2099-01-01", "10:00", "30"),
            datetime!(2098-06-01 12:00),
            UtcOffset::UTC,
        )
        .await
        .expect("second attempt succeeds");

        assert_eq!(exam.assessment_id.len(), 10);
        assert_eq!(store.exam_count().await, 1);
    }

    #[tokio::test]
    async fn verify_unknown_id_is_not_found() {
        let store = MemoryStore::default();
        let now = datetime!(2099-01-01 10:00);

        assert_eq!(verify(&store, "nope", now).await.unwrap(), Verification::NotFound);
        assert_eq!(verify(&store, "  ", now).await.unwrap(), Verification::NotFound);
        assert_eq!(Verification::NotFound.message(), "Invalid Assessment ID");
    }

    #[tokio::test]
    async fn verify_writes_back_in_progress() {
        let store = MemoryStore::default();
        let exam = seed_exam(&store, OWNER, "inprog0001", datetime!(2099-01-01 10:00), 30).await;

        let result =
            verify(&store, &exam.assessment_id, datetime!(2099-01-01 10:10)).await.unwrap();

        assert_eq!(result, Verification::InProgress);
        assert_eq!(result.tag(), "in_progress");
        assert_eq!(store.exam_status(&exam.assessment_id).await, Some(ExamStatus::InProgress));
    }

    #[tokio::test]
    async fn verify_before_start_is_valid_and_writes_nothing() {
        let store = MemoryStore::default();
        let exam = seed_exam(&store, OWNER, "future0001", datetime!(2099-01-01 10:00), 30).await;

        let result =
            verify(&store, &exam.assessment_id, datetime!(2099-01-01 09:00)).await.unwrap();

        assert_eq!(result, Verification::Valid);
        assert_eq!(store.status_writes().await, 0);
    }

    #[tokio::test]
    async fn verify_at_expiry_reports_expired() {
        let store = MemoryStore::default();
        let exam = seed_exam(&store, OWNER, "expire0001", datetime!(2099-01-01 10:00), 30).await;

        let result =
            verify(&store, &exam.assessment_id, datetime!(2099-01-01 10:30)).await.unwrap();

        assert_eq!(result, Verification::Expired);
        assert_eq!(store.exam_status(&exam.assessment_id).await, Some(ExamStatus::Expired));
    }

    #[tokio::test]
    async fn verify_never_overwrites_cancelled() {
        let store = MemoryStore::default();
        let exam = seed_exam(&store, OWNER, "cancel0001", datetime!(2099-01-01 10:00), 30).await;
        store.set_exam_status(&exam.assessment_id, ExamStatus::Cancelled).await;

        let result =
            verify(&store, &exam.assessment_id, datetime!(2099-01-01 11:00)).await.unwrap();

        assert_eq!(result, Verification::Cancelled);
        assert_eq!(store.exam_status(&exam.assessment_id).await, Some(ExamStatus::Cancelled));
        assert_eq!(store.status_writes().await, 0);
    }

    #[tokio::test]
    async fn repeated_verify_is_idempotent() {
        let store = MemoryStore::default();
        let exam = seed_exam(&store, OWNER, "repeat0001", datetime!(2099-01-01 10:00), 30).await;
        let now = datetime!(2099-01-01 10:05);

        verify(&store, &exam.assessment_id, now).await.unwrap();
        verify(&store, &exam.assessment_id, now).await.unwrap();

        assert_eq!(store.status_writes().await, 1);
    }

    #[tokio::test]
    async fn list_for_owner_orders_newest_first_and_reconciles() {
        let store = MemoryStore::default();
        let start = datetime!(2099-01-01 10:00);
        seed_exam(&store, OWNER, "older00001", start, 30).await;
        seed_exam(&store, OWNER, "newer00001", start + Duration::hours(2), 30).await;
        seed_exam(&store, "other@example.com", "other00001", start, 30).await;

        let now = datetime!(2099-01-01 10:15);
        let views = list_for_owner(&store, OWNER, now, UtcOffset::UTC).await.unwrap();

        let ids: Vec<_> = views.iter().map(|view| view.assessment_id.as_str()).collect();
        assert_eq!(ids, ["newer00001", "older00001"]);
        assert_eq!(views[0].status, ExamStatus::Active);
        assert_eq!(views[1].status, ExamStatus::InProgress);
        assert_eq!(views[1].expiry, "2099-01-01T10:30:00Z");
        assert_eq!(views[1].file_status, FILE_STATUS_NOT_UPLOADED);
        assert_eq!(store.exam_status("older00001").await, Some(ExamStatus::InProgress));
        assert_eq!(store.exam_status("newer00001").await, Some(ExamStatus::Active));
    }

    #[tokio::test]
    async fn list_for_owner_is_empty_for_new_account() {
        let store = MemoryStore::default();
        let views = list_for_owner(&store, OWNER, datetime!(2099-01-01 10:00), UtcOffset::UTC)
            .await
            .unwrap();
        assert!(views.is_empty());
    }
}
