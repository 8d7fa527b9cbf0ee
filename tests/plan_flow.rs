use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};

use dayblock::cli::{create_blocks, is_lunch_slot_free, meetings_to_blocks, round_up_to_quarter_hour};
use dayblock::clients::google_calendar::{CalendarClient, CalendarEvent};
use dayblock::config::Mode;
use dayblock::models::context::PlanningContext;
use dayblock::models::task::parse_task_list;
use dayblock::service::proposer::{
    PlanProposer, PlanRequest, PlanResponse, parse_plan_response, parse_proposed_blocks,
};
use dayblock::service::validation::validate_blocks;

type TestError = Box<dyn std::error::Error + Send + Sync>;

fn planning_date() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 20, 0, 0, 0)
        .unwrap()
}

fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 20, hour, minute, 0)
        .unwrap()
}

fn meeting(title: &str, start: (u32, u32), end: (u32, u32)) -> CalendarEvent {
    CalendarEvent {
        title: title.to_string(),
        description: String::new(),
        start: at(start.0, start.1),
        end: at(end.0, end.1),
    }
}

struct ScriptedProposer {
    payload: String,
}

#[async_trait]
impl PlanProposer for ScriptedProposer {
    async fn propose(&self, _request: &PlanRequest) -> Result<PlanResponse, TestError> {
        Ok(parse_plan_response(&self.payload)?)
    }
}

struct RecordingCalendar {
    created: Mutex<Vec<CalendarEvent>>,
    fail_on_title: Option<String>,
}

impl RecordingCalendar {
    fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            fail_on_title: None,
        }
    }

    fn failing_on(title: &str) -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            fail_on_title: Some(title.to_string()),
        }
    }
}

#[async_trait]
impl CalendarClient for RecordingCalendar {
    async fn fetch_meetings(
        &self,
        _calendar_id: &str,
        _start: DateTime<FixedOffset>,
        _end: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>, TestError> {
        Ok(Vec::new())
    }

    async fn create_event(&self, _calendar_id: &str, event: &CalendarEvent) -> Result<(), TestError> {
        if self.fail_on_title.as_deref() == Some(event.title.as_str()) {
            return Err("calendar rejected the event".into());
        }
        self.created.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[tokio::test]
async fn proposal_flows_through_validation_into_the_calendar() {
    let context = PlanningContext::new(
        Mode::Normal,
        "09:00",
        "17:00",
        "12:00",
        "13:00",
        planning_date(),
        parse_task_list("Write docs:L,Review PRs:S"),
        vec![],
    )
    .unwrap();

    let proposer = ScriptedProposer {
        payload: r#"{"blocks": [
            {"type": "focus", "title": "Write docs", "start": "09:00", "end": "10:00"},
            {"type": "break", "title": "Stretch", "start": "10:00", "end": "10:15"},
            {"type": "focus", "title": "Review PRs", "start": "10:15", "end": "10:30"}
        ]}"#
            .to_string(),
    };

    let request = PlanRequest::from_context(&context);
    let plan = proposer.propose(&request).await.unwrap();
    let accepted = parse_proposed_blocks(&plan.blocks, planning_date()).unwrap();
    validate_blocks(&accepted, &context.busy_blocks).unwrap();

    let calendar = RecordingCalendar::new();
    create_blocks(&calendar, "blocks@example.com", &accepted)
        .await
        .unwrap();

    let created = calendar.created.lock().unwrap();
    let titles: Vec<&str> = created.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Focus time", "Break", "Focus time"]);
    assert_eq!(
        created[0].description,
        "Focus time block planned by Dayblock: Write docs"
    );
    assert_eq!(created[1].description, "Break block planned by Dayblock: Stretch");
}

#[tokio::test]
async fn conflicting_proposal_never_reaches_the_calendar() {
    let context = PlanningContext::new(
        Mode::Normal,
        "09:00",
        "17:00",
        "12:00",
        "13:00",
        planning_date(),
        parse_task_list("Write docs"),
        vec![],
    )
    .unwrap();

    let proposer = ScriptedProposer {
        payload: r#"{"blocks": [
            {"type": "focus", "title": "Write docs", "start": "12:30", "end": "13:00"}
        ]}"#
            .to_string(),
    };

    let plan = proposer
        .propose(&PlanRequest::from_context(&context))
        .await
        .unwrap();
    let accepted = parse_proposed_blocks(&plan.blocks, planning_date()).unwrap();

    assert!(validate_blocks(&accepted, &context.busy_blocks).is_err());
}

#[tokio::test]
async fn create_failure_names_the_block_and_keeps_earlier_events() {
    let context = PlanningContext::new(
        Mode::Normal,
        "09:00",
        "17:00",
        "12:00",
        "13:00",
        planning_date(),
        parse_task_list("Write docs"),
        vec![],
    )
    .unwrap();

    let plan = parse_plan_response(
        r#"{"blocks": [
            {"type": "focus", "title": "Write docs", "start": "09:00", "end": "10:00"},
            {"type": "break", "title": "Stretch", "start": "10:00", "end": "10:15"}
        ]}"#,
    )
    .unwrap();
    let accepted = parse_proposed_blocks(&plan.blocks, planning_date()).unwrap();
    validate_blocks(&accepted, &context.busy_blocks).unwrap();

    let calendar = RecordingCalendar::failing_on("Break");
    let err = create_blocks(&calendar, "blocks@example.com", &accepted)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("failed to create block 'Break'"));
    // The focus block created before the failure is not rolled back.
    let created = calendar.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "Focus time");
}

#[test]
fn lunch_slot_freeness_uses_half_open_intervals() {
    let lunch_start = at(12, 0);
    let lunch_end = at(13, 0);

    let adjacent = vec![
        meeting("Morning sync", (11, 0), (12, 0)),
        meeting("Afternoon sync", (13, 0), (14, 0)),
    ];
    assert!(is_lunch_slot_free(lunch_start, lunch_end, &adjacent));

    let overlapping = vec![meeting("Overrun", (11, 30), (12, 10))];
    assert!(!is_lunch_slot_free(lunch_start, lunch_end, &overlapping));

    assert!(is_lunch_slot_free(lunch_start, lunch_end, &[]));
}

#[test]
fn degenerate_meetings_are_dropped_when_building_busy_blocks() {
    let meetings = vec![
        meeting("Standup", (9, 0), (9, 15)),
        meeting("Zero-length reminder", (10, 0), (10, 0)),
    ];

    let blocks = meetings_to_blocks(&meetings);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].title, "Standup");
}

#[test]
fn work_start_rounds_up_to_the_next_quarter_hour() {
    let cases = [
        ((9, 7), "09:15"),
        ((9, 0), "09:15"),
        ((9, 59), "10:00"),
        ((9, 15), "09:30"),
    ];

    for ((hour, minute), expected) in cases {
        let rounded = round_up_to_quarter_hour(at(hour, minute));
        assert_eq!(rounded.format("%H:%M").to_string(), expected);
    }
}
