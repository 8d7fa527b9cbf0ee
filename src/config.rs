use std::env;
use std::fmt;
use std::fs;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::FormatError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Planning mode, part of the stable contract with the config file and the
/// --mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Crunch,
    Normal,
    Saver,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Crunch => "crunch",
            Mode::Normal => "normal",
            Mode::Saver => "saver",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub work_hours: TimeRange,
    pub lunch_time: TimeRange,
    pub meetings_calendar: String,
    pub blocks_calendar: String,
    pub default_mode: Mode,
    #[serde(default)]
    pub openai_api_key: String,
    /// YYYY-MM-DD; empty means plan for today.
    #[serde(default)]
    pub date: String,
    /// IANA timezone name; empty means the system-local zone.
    #[serde(default)]
    pub timezone: String,
}

impl AppConfig {
    pub fn path() -> String {
        env::var("CONFIG_FILE").unwrap_or_else(|_| "config.json".to_string())
    }

    pub fn load() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let path = Self::path();
        let content = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read config file {path}: {e}"))?;
        let config: AppConfig =
            serde_json::from_str(&content).map_err(|e| format!("failed to parse config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), FormatError> {
        if !self.date.is_empty() {
            NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
                .map_err(|_| FormatError::Date(self.date.clone()))?;
        }
        self.zone()?;
        Ok(())
    }

    /// API key from the config file, falling back to the environment.
    pub fn resolved_openai_key(&self) -> Option<String> {
        if !self.openai_api_key.is_empty() {
            return Some(self.openai_api_key.clone());
        }
        env::var("OPENAI_API_KEY").ok()
    }

    fn zone(&self) -> Result<Option<Tz>, FormatError> {
        if self.timezone.is_empty() {
            return Ok(None);
        }
        self.timezone
            .parse::<Tz>()
            .map(Some)
            .map_err(|_| FormatError::Timezone(self.timezone.clone()))
    }

    /// The current instant, in the run's timezone.
    pub fn now(&self) -> Result<DateTime<FixedOffset>, FormatError> {
        Ok(match self.zone()? {
            Some(tz) => Utc::now().with_timezone(&tz).fixed_offset(),
            None => Local::now().fixed_offset(),
        })
    }

    /// The single reference date every clock time in a run is anchored to:
    /// midnight of the configured date, or of today when no date is set.
    pub fn planning_date(&self) -> Result<DateTime<FixedOffset>, FormatError> {
        let day = if self.date.is_empty() {
            self.now()?.date_naive()
        } else {
            NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
                .map_err(|_| FormatError::Date(self.date.clone()))?
        };
        let midnight = day.and_time(NaiveTime::MIN);

        let anchored = match self.zone()? {
            Some(tz) => tz
                .from_local_datetime(&midnight)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            None => Local
                .from_local_datetime(&midnight)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        };
        anchored.ok_or_else(|| FormatError::Date(day.to_string()))
    }
}
