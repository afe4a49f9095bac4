use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Initial `file_status` of every exam; question upload is not handled by this service.
pub(crate) const FILE_STATUS_NOT_UPLOADED: &str = "Not uploaded";

/// Lifecycle status of an exam. Stored and serialized with its display spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "examstatus")]
pub(crate) enum ExamStatus {
    Active,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Expired,
    Cancelled,
}

impl ExamStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::InProgress => "In Progress",
            Self::Expired => "Expired",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
