use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;

const EPOCH: &str = "1970-01-01T00:00:00Z";

/// Formats a unix timestamp (seconds) as an RFC 3339 UTC string.
///
/// ```
/// use nomios_core::rfc3339_from_unix;
///
/// assert_eq!(rfc3339_from_unix(1512920349), "2017-12-10T15:39:09Z");
/// ```
pub fn rfc3339_from_unix(secs: i64) -> String {
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|ts| ts.format(&Rfc3339).ok())
        .unwrap_or_else(|| {
            warn!(secs, "timestamp out of range");
            EPOCH.to_string()
        })
}

/// Same as [`rfc3339_from_unix`] for millisecond timestamps; sub-second precision is dropped.
pub fn rfc3339_from_unix_millis(millis: i64) -> String {
    rfc3339_from_unix(millis / 1000)
}
