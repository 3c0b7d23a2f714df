use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

fn now() -> OffsetDateTime {
    let utc = OffsetDateTime::now_utc();
    match UtcOffset::current_local_offset() {
        Ok(offset) => utc.to_offset(offset),
        Err(_) => utc,
    }
}

/// Wall-clock time of day for message display, e.g. `14:05:09`.
#[must_use]
pub fn display_timestamp() -> String {
    now()
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

/// RFC 3339 UTC timestamp with sub-second precision, used as note identity.
#[must_use]
pub fn rfc3339_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
