use chrono::{DateTime, Datelike, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Closed vocabulary of everything that can occupy calendar time. Meetings
/// and lunch arrive as busy time; focus and break come from the proposer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Lunch,
    Meeting,
    Break,
    Focus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBlock {
    pub block_type: BlockType,
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeBlock {
    /// Builds a block, rejecting zero-length and inverted intervals. The
    /// validator's adjacent-pair scan is only sound over positive-duration
    /// blocks, so degenerate ones are refused at the door.
    pub fn new(
        block_type: BlockType,
        title: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self, FormatError> {
        let title = title.into();
        if start >= end {
            return Err(FormatError::EmptyInterval { title, start, end });
        }
        Ok(Self {
            block_type,
            title,
            start,
            end,
        })
    }

    /// Display title for the calendar event. Planner-owned blocks get fixed
    /// labels; meetings and lunch keep their own titles.
    pub fn calendar_title(&self) -> String {
        match self.block_type {
            BlockType::Focus => "Focus time".to_string(),
            BlockType::Break => "Break".to_string(),
            _ => self.title.clone(),
        }
    }

    /// Event description. Meetings are not owned by the planner and are
    /// never annotated.
    pub fn calendar_description(&self) -> String {
        match self.block_type {
            BlockType::Focus => format!("Focus time block planned by Dayblock: {}", self.title),
            BlockType::Break => format!("Break block planned by Dayblock: {}", self.title),
            BlockType::Lunch => "Lunch break".to_string(),
            BlockType::Meeting => String::new(),
        }
    }
}

/// Combines a "HH:MM" clock time with the year/month/day (and offset) of
/// `date`, zeroing seconds. All time-of-day strings in a planning run go
/// through here with the same reference date so the resulting timestamps
/// are comparable.
pub fn parse_time_on_date(
    field: &'static str,
    text: &str,
    date: DateTime<FixedOffset>,
) -> Result<DateTime<FixedOffset>, FormatError> {
    let (hour, minute) = parse_clock(text).ok_or_else(|| FormatError::Time {
        field,
        value: text.to_string(),
    })?;

    date.timezone()
        .with_ymd_and_hms(date.year(), date.month(), date.day(), hour, minute, 0)
        .single()
        .ok_or_else(|| FormatError::Time {
            field,
            value: text.to_string(),
        })
}

/// Strict 24-hour "HH:MM": exactly two digits on each side, so "9:00"
/// is rejected rather than silently accepted.
fn parse_clock(text: &str) -> Option<(u32, u32)> {
    let (hh, mm) = text.split_once(':')?;
    if hh.len() != 2 || mm.len() != 2 {
        return None;
    }
    if !hh.bytes().all(|b| b.is_ascii_digit()) || !mm.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = hh.parse().ok()?;
    let minute: u32 = mm.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 0, 0, 0)
            .unwrap()
    }

    #[test]
    fn parses_clock_time_onto_reference_date() {
        let parsed = parse_time_on_date("work start", "09:30", day()).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-15T09:30:00+01:00");
    }

    #[test]
    fn parsing_is_deterministic() {
        let a = parse_time_on_date("work start", "09:00", day()).unwrap();
        let b = parse_time_on_date("work start", "09:00", day()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_out_of_range_and_sloppy_formats() {
        for bad in ["25:00", "12:60", "9:00", "09:5", "nine", "09-00", ""] {
            let err = parse_time_on_date("work start", bad, day()).unwrap_err();
            assert!(matches!(err, FormatError::Time { field: "work start", .. }), "{bad}");
        }
    }

    #[test]
    fn planner_owned_blocks_get_fixed_titles() {
        let start = parse_time_on_date("start", "09:00", day()).unwrap();
        let end = parse_time_on_date("end", "10:00", day()).unwrap();
        let focus = TimeBlock::new(BlockType::Focus, "Write docs", start, end).unwrap();
        assert_eq!(focus.calendar_title(), "Focus time");
        assert_eq!(
            focus.calendar_description(),
            "Focus time block planned by Dayblock: Write docs"
        );

        let meeting = TimeBlock::new(BlockType::Meeting, "Standup", start, end).unwrap();
        assert_eq!(meeting.calendar_title(), "Standup");
        assert_eq!(meeting.calendar_description(), "");
    }

    #[test]
    fn rejects_degenerate_intervals() {
        let start = parse_time_on_date("start", "10:00", day()).unwrap();
        let err = TimeBlock::new(BlockType::Focus, "Nothing", start, start).unwrap_err();
        assert!(matches!(err, FormatError::EmptyInterval { .. }));
    }
}
