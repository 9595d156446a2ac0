//! Scheduling annotations embedded in note text.
//!
//! A card's schedule is stored next to its source as an HTML comment, one
//! `!date,interval,ease` segment per sibling in sibling order:
//!
//! ```text
//! <!--SR:!2024-05-01,26,250!2024-05-03,3.5,230-->
//! ```
//!
//! The older single-card form `<!--SR:2024-05-01,26,250-->` is still read
//! and is rewritten in the current form on the next write. Anything else
//! that starts with `<!--SR:` is treated as absent: the card reads as new.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RecallError, RecallResult};
use crate::types::Card;

const DATE_FORMAT: &str = "%Y-%m-%d";

static ANY_ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<!--SR:[^>]*-->").unwrap());

static MULTI_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<!--SR:((?:!\d{4}-\d{2}-\d{2},\d+(?:\.\d+)?,\d+)+)-->$").unwrap()
});

static SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!(\d{4}-\d{2}-\d{2}),(\d+(?:\.\d+)?),(\d+)").unwrap());

static LEGACY_ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<!--SR:(\d{4}-\d{2}-\d{2}),(\d+(?:\.\d+)?),(\d+)-->$").unwrap());

static STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*\r?\n?[ \t]*<!--SR:[^>]*-->").unwrap());

/// Stored schedule of one card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAnnotation {
    pub due: NaiveDate,
    /// Interval in days.
    pub interval: f64,
    /// Ease in percent.
    pub ease: u32,
}

impl ScheduleAnnotation {
    pub fn new(due: NaiveDate, interval: f64, ease: u32) -> Self {
        Self { due, interval, ease }
    }

    /// Annotation for a card with review history.
    pub fn from_card(card: &Card) -> Option<Self> {
        card.due.map(|due| Self::new(due.date_naive(), card.interval, card.ease))
    }

    /// Due date as the start of that day in UTC.
    pub fn due_at(&self) -> DateTime<Utc> {
        self.due.and_time(NaiveTime::MIN).and_utc()
    }

    /// Give `card` this schedule, as of `now`.
    pub fn apply_to(&self, card: Card, now: DateTime<Utc>) -> Card {
        card.scheduled(self.due_at(), self.interval, self.ease, now)
    }

    fn segment(&self) -> String {
        format!(
            "!{},{},{}",
            self.due.format(DATE_FORMAT),
            format_interval(self.interval),
            self.ease
        )
    }
}

/// Shortest text that parses back to the same interval. The pattern only
/// admits plain non-negative decimals, so anything else is written as 0.
fn format_interval(interval: f64) -> String {
    if interval.is_finite() && interval > 0.0 {
        format!("{}", interval)
    } else {
        "0".to_string()
    }
}

/// Encode sibling schedules as one annotation comment.
pub fn encode(schedules: &[ScheduleAnnotation]) -> String {
    let segments: String = schedules.iter().map(ScheduleAnnotation::segment).collect();
    format!("<!--SR:{}-->", segments)
}

/// Read the sibling schedules stored in `text`.
///
/// A missing or malformed annotation yields an empty list, meaning every
/// sibling is a new card.
pub fn decode(text: &str) -> Vec<ScheduleAnnotation> {
    match decode_strict(text) {
        Ok(schedules) => schedules,
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring malformed scheduling annotation");
            Vec::new()
        }
    }
}

/// Like [`decode`], but a malformed annotation is an error.
///
/// Text without any annotation still decodes to an empty list.
pub fn decode_strict(text: &str) -> RecallResult<Vec<ScheduleAnnotation>> {
    let Some(found) = ANY_ANNOTATION.find(text) else {
        return Ok(Vec::new());
    };
    parse_comment(found.as_str())
}

fn parse_comment(comment: &str) -> RecallResult<Vec<ScheduleAnnotation>> {
    if let Some(caps) = MULTI_ANNOTATION.captures(comment) {
        return SEGMENT
            .captures_iter(&caps[1])
            .map(|segment| parse_fields(&segment[1], &segment[2], &segment[3]))
            .collect();
    }
    if let Some(caps) = LEGACY_ANNOTATION.captures(comment) {
        return Ok(vec![parse_fields(&caps[1], &caps[2], &caps[3])?]);
    }
    Err(RecallError::annotation(format!("unrecognized annotation {}", comment)))
}

fn parse_fields(date: &str, interval: &str, ease: &str) -> RecallResult<ScheduleAnnotation> {
    let due = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| RecallError::annotation(format!("invalid due date {}: {}", date, e)))?;
    let interval: f64 = interval
        .parse()
        .map_err(|_| RecallError::annotation(format!("invalid interval {}", interval)))?;
    let ease: u32 = ease
        .parse()
        .map_err(|_| RecallError::annotation(format!("invalid ease {}", ease)))?;
    Ok(ScheduleAnnotation::new(due, interval, ease))
}

/// Remove any annotation, and the whitespace that led up to it, from `text`.
pub fn strip(text: &str) -> String {
    STRIP.replace_all(text, "").into_owned()
}

/// Store `schedule` for sibling number `sibling` in `text`.
///
/// Without an annotation a fresh one is appended, after a space when
/// `same_line` is set and on the next line otherwise. With one, the
/// sibling's segment is replaced if it exists and a segment is appended if
/// not; a legacy annotation is rewritten in the current form.
pub fn write_schedule(
    text: &str,
    sibling: usize,
    schedule: ScheduleAnnotation,
    same_line: bool,
) -> String {
    let Some(found) = ANY_ANNOTATION.find(text) else {
        let separator = if same_line { " " } else { "\n" };
        return format!("{}{}{}", text, separator, encode(&[schedule]));
    };

    let mut schedules = decode(found.as_str());
    match schedules.get_mut(sibling) {
        Some(existing) => *existing = schedule,
        None => schedules.push(schedule),
    }

    let mut updated = text.to_string();
    updated.replace_range(found.range(), &encode(&schedules));
    updated
}
