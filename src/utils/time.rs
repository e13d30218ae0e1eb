use chrono::{DateTime, SecondsFormat, Utc};

/// ISO-8601 rendering of an epoch-millisecond instant, e.g.
/// `2026-08-25T12:00:00.000Z`.
pub(crate) fn epoch_ms_to_iso(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(instant) => instant.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_ms_to_iso() {
        assert_eq!(epoch_ms_to_iso(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(epoch_ms_to_iso(1_700_000_000_123), "2023-11-14T22:13:20.123Z");
    }
}
