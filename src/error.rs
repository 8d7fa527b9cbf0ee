use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::models::block::TimeBlock;

/// Malformed input somewhere between the config file and the proposer
/// response. Always names the field that failed to parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid {field} time '{value}': expected 24-hour HH:MM")]
    Time { field: &'static str, value: String },
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    Date(String),
    #[error("invalid timezone '{0}': expected an IANA name like Europe/Stockholm")]
    Timezone(String),
    #[error("block '{title}' ends at or before it starts ({})", clock_range(.start, .end))]
    EmptyInterval {
        title: String,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
    #[error("planner response is not valid JSON: {0}")]
    Response(String),
    #[error("invalid block {index}: {source}")]
    Block {
        index: usize,
        #[source]
        source: Box<FormatError>,
    },
}

impl FormatError {
    /// Wraps an error from converting a single proposed block, recording its
    /// 1-based position in the proposal.
    pub fn at_block(self, index: usize) -> FormatError {
        FormatError::Block {
            index,
            source: Box::new(self),
        }
    }
}

/// A schedule validation failure. Carries both conflicting blocks so the
/// caller can show exactly which pair collided.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConflictError {
    #[error(
        "block '{}' ({}) overlaps with busy time '{}' ({})",
        .proposed.title, block_range(.proposed), .busy.title, block_range(.busy)
    )]
    Busy { proposed: TimeBlock, busy: TimeBlock },
    #[error(
        "blocks overlap: '{}' ({}) and '{}' ({})",
        .first.title, block_range(.first), .second.title, block_range(.second)
    )]
    Proposed { first: TimeBlock, second: TimeBlock },
}

fn clock_range(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> String {
    format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
}

fn block_range(block: &TimeBlock) -> String {
    clock_range(&block.start, &block.end)
}
