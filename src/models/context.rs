use chrono::{DateTime, FixedOffset};

use crate::config::Mode;
use crate::error::FormatError;
use crate::models::block::{BlockType, TimeBlock, parse_time_on_date};
use crate::models::task::Task;

/// Everything fixed about one planning run. All timestamps are anchored to
/// the same reference date, so interval comparisons downstream are
/// meaningful. Built once per run and never mutated.
#[derive(Debug, Clone)]
pub struct PlanningContext {
    pub mode: Mode,
    pub work_start: DateTime<FixedOffset>,
    pub work_end: DateTime<FixedOffset>,
    pub lunch_start: DateTime<FixedOffset>,
    pub lunch_end: DateTime<FixedOffset>,
    pub tasks: Vec<Task>,
    pub busy_blocks: Vec<TimeBlock>,
}

impl PlanningContext {
    /// Anchors the four configured clock times to `date` and folds the lunch
    /// window into the busy list, ahead of the supplied meetings (whose
    /// order is preserved).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mode: Mode,
        work_start: &str,
        work_end: &str,
        lunch_start: &str,
        lunch_end: &str,
        date: DateTime<FixedOffset>,
        tasks: Vec<Task>,
        busy_blocks: Vec<TimeBlock>,
    ) -> Result<Self, FormatError> {
        let work_start = parse_time_on_date("work start", work_start, date)?;
        let work_end = parse_time_on_date("work end", work_end, date)?;
        let lunch_start = parse_time_on_date("lunch start", lunch_start, date)?;
        let lunch_end = parse_time_on_date("lunch end", lunch_end, date)?;

        let lunch = TimeBlock::new(BlockType::Lunch, "Lunch", lunch_start, lunch_end)?;
        let mut all_busy = Vec::with_capacity(busy_blocks.len() + 1);
        all_busy.push(lunch);
        all_busy.extend(busy_blocks);

        Ok(Self {
            mode,
            work_start,
            work_end,
            lunch_start,
            lunch_end,
            tasks,
            busy_blocks: all_busy,
        })
    }
}
