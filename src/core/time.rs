use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Current instant as a naive UTC timestamp, the representation stored in every table.
pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    to_primitive_utc(OffsetDateTime::now_utc())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

/// Renders a stored UTC timestamp as RFC 3339 in the caller-facing offset.
pub(crate) fn format_in_offset(value: PrimitiveDateTime, offset: UtcOffset) -> String {
    let shifted = value.assume_utc().to_offset(offset);
    shifted.format(&Rfc3339).unwrap_or_else(|_| shifted.to_string())
}
