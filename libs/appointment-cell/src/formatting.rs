//! en-US renderings of the appointment date and time.
//!
//! Summary strings go into the exported document, wire strings into the
//! booking payload. All of them depend only on the stored value.

use chrono::NaiveDateTime;

/// `October 19, 2026`
pub fn format_summary_date(date: &NaiveDateTime) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `2:30 PM`
pub fn format_summary_time(time: &NaiveDateTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// `10/19/2026`
pub fn format_wire_date(date: &NaiveDateTime) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// `2:30:00 PM`
pub fn format_wire_time(time: &NaiveDateTime) -> String {
    time.format("%-I:%M:%S %p").to_string()
}
