//! Time parsing and the text shown for each tracked spawn.

use chrono::{DateTime, Utc};

use crate::paginator::{abbreviate, BoardRow};
use crate::types::SpawnSignal;

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Session clock reading for a wall-clock instant: minutes since the epoch.
pub fn session_minutes(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 60_000.0
}

/// Parse `[-]M` or `[-]H:MM` / `[-]HH:MM` into signed minutes.
pub fn parse_minutes(text: &str) -> Option<i64> {
    let (negate, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    let minutes = match body.split_once(':') {
        Some((hours, minutes)) => {
            if hours.len() > 2 || minutes.len() != 2 || !all_digits(hours) || !all_digits(minutes) {
                return None;
            }
            let hours: i64 = hours.parse().ok()?;
            let minutes: i64 = minutes.parse().ok()?;
            if hours >= 24 || minutes >= 60 {
                return None;
            }
            hours * 60 + minutes
        }
        None => {
            if !all_digits(body) {
                return None;
            }
            body.parse().ok()?
        }
    };
    Some(if negate { -minutes } else { minutes })
}

/// Turn a time-of-death argument into a session-clock instant.
///
/// `M` means M minutes before `now`. `HH:MM` is a server-local clock time
/// (UTC + `utc_offset`) and resolves to its most recent past occurrence.
pub fn parse_time_of_death(text: &str, now: f64, utc_offset: i64) -> Option<f64> {
    let minutes = parse_minutes(text)?;
    if minutes < 0 {
        return None;
    }
    if !text.contains(':') {
        return Some(now - minutes as f64);
    }
    let target = (minutes - utc_offset) as f64;
    let elapsed = (now - target).rem_euclid(MINUTES_PER_DAY);
    Some(now - elapsed)
}

/// `[-]HH:MM` for a signed minute count.
pub fn minutes_to_hhmm(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let minutes = minutes.abs();
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Server-local `HH:MM` of a session-clock instant.
pub fn format_clock(at: f64, utc_offset: i64) -> String {
    let seconds = ((at + utc_offset as f64) * 60.0).floor() as i64;
    match DateTime::<Utc>::from_timestamp(seconds, 0) {
        Some(time) => time.format("%H:%M").to_string(),
        None => "??:??".to_string(),
    }
}

/// `"1 Minute"`, `"3 Minutes"`.
pub fn quantity(noun: &str, amount: i64) -> String {
    let plural = if amount == 1 { "" } else { "s" };
    format!("{amount} {noun}{plural}")
}

/// Board row for one tracked spawn at refresh time `now`.
pub fn status_row(label: &str, signal: &SpawnSignal, now: f64) -> BoardRow {
    let mut name = abbreviate(label);
    let since_min = (now - signal.min_time).round_ties_even() as i64;
    let since_max = (now - signal.max_time).round_ties_even() as i64;
    let (near, far) = {
        let (a, b) = (since_min.abs(), since_max.abs());
        (a.min(b), a.max(b))
    };
    let mut probability = format!("{}%", (signal.probability * 100.0).floor() as i64);

    let span = if since_min == since_max || (since_max < 0 && 0 < since_min) {
        quantity("Minute", since_max.abs())
    } else {
        format!("{near}~{far} Minutes")
    };

    let status = if since_min < 0 {
        format!("In {span}  ")
    } else if since_max < 0 {
        format!("Within {span}  ")
    } else {
        name = format!("**{name}**");
        probability = format!("**{probability}**");
        format!("**{span} Ago**  ")
    };

    BoardRow {
        name: format!("{name}  "),
        status,
        probability,
    }
}
