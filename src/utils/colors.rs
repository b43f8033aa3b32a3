/// ANSI color helper utilities for terminal output.
use crate::models::attendance::Status;

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Present → green, Late → yellow, Absent → red.
pub fn color_for_status(status: Status) -> &'static str {
    match status {
        Status::Present => GREEN,
        Status::Late => YELLOW,
        Status::Absent => RED,
    }
}

/// Wrap an optional cell: empty values and "--:--" are greyed out.
pub fn colorize_optional(value: &str) -> String {
    let v = value.trim();
    if v.is_empty() || v == "--:--" || v == "0s" {
        format!("{GREY}{value}{RESET}")
    } else {
        value.to_string()
    }
}

pub fn colorize_status(status: Status) -> String {
    format!("{}{}{}", color_for_status(status), status.as_str(), RESET)
}

/// Non-zero counters are highlighted, zeros are greyed.
pub fn colorize_count(n: i64, color: &str) -> String {
    if n == 0 {
        format!("{GREY}{n}{RESET}")
    } else {
        format!("{color}{n}{RESET}")
    }
}
