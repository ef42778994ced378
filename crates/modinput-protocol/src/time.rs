// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unix-epoch rendering for `<time>`.

use chrono::{DateTime, Utc};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Seconds since 1970-01-01T00:00:00Z.
///
/// Whole seconds render without a fraction; otherwise the fractional part
/// keeps full nanosecond precision with trailing zeros removed.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use modinput_protocol::format_unix_time;
///
/// let t = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(format_unix_time(t), "1356998400");
/// ```
#[must_use]
pub fn format_unix_time(time: DateTime<Utc>) -> String {
    let total = i128::from(time.timestamp()) * NANOS_PER_SEC as i128
        + i128::from(time.timestamp_subsec_nanos());
    let sign = if total < 0 { "-" } else { "" };
    let abs = total.unsigned_abs();
    let secs = abs / NANOS_PER_SEC;
    let frac = abs % NANOS_PER_SEC;
    if frac == 0 {
        return format!("{sign}{secs}");
    }
    let digits = format!("{frac:09}");
    format!("{sign}{secs}.{}", digits.trim_end_matches('0'))
}
