use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::clients::openai_client;
use crate::config::Mode;
use crate::error::FormatError;
use crate::models::block::{BlockType, TimeBlock, parse_time_on_date};
use crate::models::context::PlanningContext;

/// What the proposer gets to see: the work window, occupied time, and the
/// tasks with their sizes. Block types are dropped on the way out since the
/// proposer only reasons about titles and times.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub work_start: DateTime<FixedOffset>,
    pub work_end: DateTime<FixedOffset>,
    pub busy_blocks: Vec<BusyEntry>,
    pub tasks: Vec<TaskEntry>,
    pub mode: Mode,
}

#[derive(Debug, Clone)]
pub struct BusyEntry {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone)]
pub struct TaskEntry {
    pub title: String,
    pub duration_minutes: u64,
}

impl PlanRequest {
    pub fn from_context(context: &PlanningContext) -> Self {
        Self {
            work_start: context.work_start,
            work_end: context.work_end,
            busy_blocks: context
                .busy_blocks
                .iter()
                .map(|block| BusyEntry {
                    title: block.title.clone(),
                    start: block.start,
                    end: block.end,
                })
                .collect(),
            tasks: context
                .tasks
                .iter()
                .map(|task| TaskEntry {
                    title: task.title.clone(),
                    duration_minutes: task.duration.as_secs() / 60,
                })
                .collect(),
            mode: context.mode,
        }
    }
}

/// A single block as the proposer wrote it: stringly-typed clock times, not
/// yet anchored to any date.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProposedBlock {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub title: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlanResponse {
    pub blocks: Vec<ProposedBlock>,
}

/// The proposer is an untrusted collaborator: whatever text it returns must
/// parse as the agreed JSON shape or the whole proposal is rejected.
pub fn parse_plan_response(text: &str) -> Result<PlanResponse, FormatError> {
    serde_json::from_str(text).map_err(|e| FormatError::Response(e.to_string()))
}

impl ProposedBlock {
    /// Anchors the block's clock times to the planning date. Fails naming
    /// whichever of start/end is not valid 24-hour HH:MM.
    pub fn to_time_block(&self, date: DateTime<FixedOffset>) -> Result<TimeBlock, FormatError> {
        let start = parse_time_on_date("start", &self.start, date)?;
        let end = parse_time_on_date("end", &self.end, date)?;
        TimeBlock::new(self.block_type, self.title.clone(), start, end)
    }
}

/// Converts a whole proposal, all-or-nothing. The first block that fails to
/// parse aborts the batch, reported by its 1-based position.
pub fn parse_proposed_blocks(
    blocks: &[ProposedBlock],
    date: DateTime<FixedOffset>,
) -> Result<Vec<TimeBlock>, FormatError> {
    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| block.to_time_block(date).map_err(|e| e.at_block(i + 1)))
        .collect()
}

#[async_trait]
pub trait PlanProposer: Send + Sync {
    async fn propose(
        &self,
        request: &PlanRequest,
    ) -> Result<PlanResponse, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct OpenAiProposer {
    api_key: String,
}

impl OpenAiProposer {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }
}

#[async_trait]
impl PlanProposer for OpenAiProposer {
    async fn propose(
        &self,
        request: &PlanRequest,
    ) -> Result<PlanResponse, Box<dyn std::error::Error + Send + Sync>> {
        let prompt = build_prompt(request);
        let content = openai_client::generate_plan_completion(&prompt, &self.api_key).await?;
        Ok(parse_plan_response(&content)?)
    }
}

pub fn build_prompt(request: &PlanRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a calendar planning assistant. Create a day schedule with focus blocks and breaks.\n\n",
    );
    prompt.push_str(&format!(
        "Work hours: {} - {}\n\n",
        request.work_start.format("%H:%M"),
        request.work_end.format("%H:%M")
    ));

    prompt.push_str("Busy times (unavailable for scheduling):\n");
    if request.busy_blocks.is_empty() {
        prompt.push_str("- No busy times\n");
    }
    for block in &request.busy_blocks {
        prompt.push_str(&format!(
            "- {} ({} - {})\n",
            block.title,
            block.start.format("%H:%M"),
            block.end.format("%H:%M")
        ));
    }
    prompt.push('\n');

    prompt.push_str("Tasks to schedule:\n");
    for task in &request.tasks {
        prompt.push_str(&format!("- {} ({} minutes)\n", task.title, task.duration_minutes));
    }
    prompt.push('\n');

    prompt.push_str(mode_instructions(request.mode));
    prompt.push_str("\n\n");

    prompt.push_str(
        "IMPORTANT: Return ONLY valid JSON in this exact format with no additional text:\n\
         {\n\
           \"blocks\": [\n\
             {\"type\": \"focus\", \"title\": \"Task name\", \"start\": \"HH:MM\", \"end\": \"HH:MM\"},\n\
             {\"type\": \"break\", \"title\": \"Short break\", \"start\": \"HH:MM\", \"end\": \"HH:MM\"}\n\
           ]\n\
         }\n\n\
         Rules:\n\
         - Do NOT overlap with busy times\n\
         - Stay within work hours\n\
         - Use 24-hour format (HH:MM)\n\
         - Types: \"focus\" for tasks, \"break\" for breaks\n\
         - Return ONLY the JSON, no explanation or markdown\n",
    );

    prompt
}

fn mode_instructions(mode: Mode) -> &'static str {
    match mode {
        Mode::Crunch => {
            "Mode: CRUNCH - Pack as many tasks as possible with minimal breaks (5-10 min). Maximize productivity."
        }
        Mode::Saver => {
            "Mode: ENERGY SAVER - User is tired. Add longer breaks (15-20 min), extra padding between tasks, and consider ending early if possible."
        }
        Mode::Normal => {
            "Mode: NORMAL - Balanced approach with regular breaks (10-15 min) following standard productivity practices."
        }
    }
}
