//! Date and time handling for appointment slots.
//!
//! The backend sends dates as `YYYY-MM-DD` and times as `HH:MM` or
//! `HH:MM:SS`. Anything else is treated as unknown: it sorts after every
//! known slot and is displayed as sent.

use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn parse_time(raw: &str) -> Option<Time> {
    let raw = raw.trim();
    Time::parse(raw, format_description!("[hour]:[minute]:[second]"))
        .or_else(|_| Time::parse(raw, format_description!("[hour]:[minute]")))
        .ok()
}

/// The combined date and time of a slot, if both parts parse.
pub fn slot(date: &str, time: &str) -> Option<PrimitiveDateTime> {
    Some(PrimitiveDateTime::new(parse_date(date)?, parse_time(time)?))
}

/// `March 5, 2025`
pub fn long_date(raw: &str) -> String {
    parse_date(raw)
        .and_then(|d| {
            d.format(format_description!(
                "[month repr:long] [day padding:none], [year]"
            ))
            .ok()
        })
        .unwrap_or_else(|| raw.to_string())
}

/// `Mar 5`
pub fn short_date(raw: &str) -> String {
    parse_date(raw)
        .and_then(|d| {
            d.format(format_description!("[month repr:short] [day padding:none]"))
                .ok()
        })
        .unwrap_or_else(|| raw.to_string())
}

/// `2:30 PM`
pub fn clock_time(raw: &str) -> String {
    parse_time(raw)
        .and_then(|t| {
            t.format(format_description!(
                "[hour repr:12 padding:none]:[minute] [period]"
            ))
            .ok()
        })
        .unwrap_or_else(|| raw.to_string())
}
