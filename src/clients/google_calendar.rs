use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

type ClientResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// A calendar event as the planner sees it, on either side of the API:
/// fetched busy time or a block to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub title: String,
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Timed events in [start, end); all-day events never appear.
    async fn fetch_meetings(
        &self,
        calendar_id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> ClientResult<Vec<CalendarEvent>>;

    async fn create_event(&self, calendar_id: &str, event: &CalendarEvent) -> ClientResult<()>;
}

pub struct GoogleCalendarClient {
    client: reqwest::Client,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(access_token: String) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            access_token,
        })
    }

    fn events_url(calendar_id: &str) -> String {
        format!("{CALENDAR_API_BASE}/calendars/{calendar_id}/events")
    }
}

#[derive(Debug, Deserialize)]
struct EventsListResponse {
    items: Option<Vec<GcalEvent>>,
}

#[derive(Debug, Deserialize)]
struct GcalEvent {
    summary: Option<String>,
    start: Option<GcalEventTime>,
    end: Option<GcalEventTime>,
}

#[derive(Debug, Deserialize)]
struct GcalEventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateEventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: CreateEventTime,
    end: CreateEventTime,
}

#[derive(Debug, Serialize)]
struct CreateEventTime {
    #[serde(rename = "dateTime")]
    date_time: String,
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn fetch_meetings(
        &self,
        calendar_id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> ClientResult<Vec<CalendarEvent>> {
        let response = self
            .client
            .get(Self::events_url(calendar_id))
            .query(&[
                ("timeMin", start.to_rfc3339()),
                ("timeMax", end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(format!("failed to fetch events: http {status}: {body}").into());
        }

        let parsed: EventsListResponse = serde_json::from_str(&body)
            .map_err(|e| format!("invalid events payload: {e}; body={body}"))?;

        let mut meetings = Vec::new();
        for event in parsed.items.unwrap_or_default() {
            // All-day events carry a date instead of a dateTime; they are
            // not busy time for block planning.
            let (Some(start_text), Some(end_text)) = (
                event.start.and_then(|t| t.date_time),
                event.end.and_then(|t| t.date_time),
            ) else {
                continue;
            };
            let (Ok(start), Ok(end)) = (
                DateTime::parse_from_rfc3339(&start_text),
                DateTime::parse_from_rfc3339(&end_text),
            ) else {
                continue;
            };

            meetings.push(CalendarEvent {
                title: event.summary.unwrap_or_default(),
                description: String::new(),
                start,
                end,
            });
        }

        Ok(meetings)
    }

    async fn create_event(&self, calendar_id: &str, event: &CalendarEvent) -> ClientResult<()> {
        let body = CreateEventBody {
            summary: &event.title,
            description: &event.description,
            start: CreateEventTime {
                date_time: event.start.to_rfc3339(),
            },
            end: CreateEventTime {
                date_time: event.end.to_rfc3339(),
            },
        };

        let response = self
            .client
            .post(Self::events_url(calendar_id))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("failed to create event: http {status}: {text}").into());
        }

        Ok(())
    }
}
