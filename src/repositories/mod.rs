pub(crate) mod accounts;
pub(crate) mod exams;
pub(crate) mod store;
