// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ISO-8601 UTC timestamps as stored in `driver_internal_info`.

use chrono::NaiveDateTime;

/// Microsecond-precision timestamp without zone suffix,
/// e.g. `2026-03-01T17:20:05.123000`.
pub fn iso_utc(epoch_ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(epoch_ms as i64)
        .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
        .unwrap_or_else(|| "1970-01-01T00:00:00.000000".to_string())
}

/// Parse a timestamp written by [`iso_utc`]; fractional seconds optional.
pub fn parse_iso_utc(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
