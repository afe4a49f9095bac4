pub(crate) mod assessment_lifecycle;
pub(crate) mod assessments;
