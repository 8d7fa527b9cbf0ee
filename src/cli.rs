use chrono::{DateTime, Duration, FixedOffset, Timelike};
use clap::{Parser, Subcommand};
use inquire::Confirm;

use crate::clients::google_auth;
use crate::clients::google_calendar::{CalendarClient, CalendarEvent, GoogleCalendarClient};
use crate::config::{AppConfig, Mode};
use crate::models::block::{BlockType, TimeBlock};
use crate::models::context::PlanningContext;
use crate::models::task::parse_task_list;
use crate::service::proposer::{OpenAiProposer, PlanProposer, PlanRequest, parse_proposed_blocks};
use crate::service::validation::validate_blocks;

type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(
    name = "dayblock",
    about = "AI-powered calendar block planner",
    long_about = "Dayblock schedules focus and break blocks in your Google Calendar \
                  based on your tasks, meetings, and chosen mode (crunch, normal, or saver)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan your day with AI-powered focus blocks
    Plan {
        /// Comma-separated tasks with optional sizes, e.g. "Write docs:L,Review PRs:S"
        #[arg(short, long)]
        tasks: String,
        /// Planning mode; defaults to the config file's default_mode
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,
        /// Create blocks without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Display the current configuration
    Config,
}

pub async fn cli() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Plan { tasks, mode, yes } => run_plan(&tasks, mode, yes).await,
        Commands::Config => show_config(),
    }
}

fn show_config() -> CliResult<()> {
    let config = AppConfig::load()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn run_plan(tasks: &str, mode: Option<Mode>, yes: bool) -> CliResult<()> {
    let config = AppConfig::load()?;
    let mode = mode.unwrap_or(config.default_mode);

    let task_list = parse_task_list(tasks);
    if task_list.is_empty() {
        return Err("no tasks to plan; pass them with --tasks".into());
    }

    let planning_date = config.planning_date()?;

    println!("🎯 Planning your day...");
    println!("Date: {}", planning_date.format("%A, %B %-d, %Y"));
    println!("Mode: {mode}");
    println!(
        "Work Hours: {} - {}",
        config.work_hours.start, config.work_hours.end
    );
    println!(
        "Lunch Time: {} - {}",
        config.lunch_time.start, config.lunch_time.end
    );
    println!("Tasks ({}):", task_list.len());
    for (i, task) in task_list.iter().enumerate() {
        println!(
            "  {}. {} ({} min)",
            i + 1,
            task.title,
            task.duration.as_secs() / 60
        );
    }

    println!("\n🔐 Authenticating with Google Calendar...");
    let access_token = google_auth::access_token().await?;
    let calendar = GoogleCalendarClient::new(access_token)?;
    println!("✅ Successfully authenticated!");

    println!(
        "\n📆 Fetching meetings from calendar: {}",
        config.meetings_calendar
    );
    let meetings = calendar
        .fetch_meetings(
            &config.meetings_calendar,
            planning_date,
            planning_date + Duration::hours(24),
        )
        .await
        .map_err(|e| format!("failed to fetch meetings: {e}"))?;
    if meetings.is_empty() {
        println!("  No meetings found for the day");
    } else {
        println!("  Found {} meeting(s):", meetings.len());
        for (i, meeting) in meetings.iter().enumerate() {
            println!(
                "  {}. {} ({} - {})",
                i + 1,
                meeting.title,
                meeting.start.format("%H:%M"),
                meeting.end.format("%H:%M")
            );
        }
    }

    let mut context = PlanningContext::new(
        mode,
        &config.work_hours.start,
        &config.work_hours.end,
        &config.lunch_time.start,
        &config.lunch_time.end,
        planning_date,
        task_list,
        meetings_to_blocks(&meetings),
    )?;

    // When planning today and the morning is already gone, start from the
    // next clean 15-minute slot instead of the configured work start.
    let now = config.now()?;
    if planning_date.date_naive() == now.date_naive() && now > context.work_start {
        let rounded = round_up_to_quarter_hour(now);
        if rounded >= context.work_end {
            return Err(format!(
                "no time left in work day to plan (it's already {})",
                now.format("%H:%M")
            )
            .into());
        }
        context.work_start = rounded;
        println!(
            "📍 Adjusted start time to {} (current time)",
            rounded.format("%H:%M")
        );
    }

    println!("\n🤖 Generating plan with AI...");
    let api_key = config
        .resolved_openai_key()
        .ok_or("openai_api_key is not set in config and OPENAI_API_KEY is not in the environment")?;
    let proposer = OpenAiProposer::new(api_key);
    let request = PlanRequest::from_context(&context);
    let plan = proposer.propose(&request).await?;

    println!("\n✨ Generated {} blocks:", plan.blocks.len());
    for (i, block) in plan.blocks.iter().enumerate() {
        let icon = if block.block_type == BlockType::Break {
            "☕"
        } else {
            "🎯"
        };
        println!(
            "  {}. {} {} ({} - {})",
            i + 1,
            icon,
            block.title,
            block.start,
            block.end
        );
    }

    let mut accepted = parse_proposed_blocks(&plan.blocks, planning_date)?;
    validate_blocks(&accepted, &context.busy_blocks)?;

    // Lunch goes on the calendar too, as long as no meeting already sits in
    // the slot.
    if is_lunch_slot_free(context.lunch_start, context.lunch_end, &meetings) {
        accepted.push(TimeBlock::new(
            BlockType::Lunch,
            "Lunch",
            context.lunch_start,
            context.lunch_end,
        )?);
    }

    if !yes {
        let confirmed = Confirm::new(&format!(
            "Create {} blocks in calendar '{}'?",
            accepted.len(),
            config.blocks_calendar
        ))
        .with_default(true)
        .prompt()?;
        if !confirmed {
            println!("Aborted, nothing created.");
            return Ok(());
        }
    }

    println!("\n📝 Creating blocks in calendar...");
    create_blocks(&calendar, &config.blocks_calendar, &accepted).await?;
    println!("\n✅ Successfully created all blocks in calendar!");

    Ok(())
}

/// Fetched meetings become busy blocks; anything degenerate the API hands
/// back (zero-length reminders and the like) is not schedulable time and is
/// skipped.
pub fn meetings_to_blocks(meetings: &[CalendarEvent]) -> Vec<TimeBlock> {
    meetings
        .iter()
        .filter_map(|meeting| {
            TimeBlock::new(
                BlockType::Meeting,
                meeting.title.clone(),
                meeting.start,
                meeting.end,
            )
            .ok()
        })
        .collect()
}

/// True when no fetched meeting overlaps the lunch window (half-open, so a
/// meeting ending exactly at lunch start does not count).
pub fn is_lunch_slot_free(
    lunch_start: DateTime<FixedOffset>,
    lunch_end: DateTime<FixedOffset>,
    meetings: &[CalendarEvent],
) -> bool {
    !meetings
        .iter()
        .any(|meeting| meeting.start < lunch_end && lunch_start < meeting.end)
}

pub fn round_up_to_quarter_hour(t: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let into_slot = (t.minute() % 15) as i64 * 60 + t.second() as i64;
    let t = t.with_nanosecond(0).unwrap_or(t);
    t - Duration::seconds(into_slot) + Duration::minutes(15)
}

/// Hands the accepted blocks to the calendar in order. A failure aborts the
/// run naming the block; blocks already created stay on the calendar.
pub async fn create_blocks(
    client: &dyn CalendarClient,
    calendar_id: &str,
    blocks: &[TimeBlock],
) -> CliResult<()> {
    for block in blocks {
        let event = CalendarEvent {
            title: block.calendar_title(),
            description: block.calendar_description(),
            start: block.start,
            end: block.end,
        };

        client
            .create_event(calendar_id, &event)
            .await
            .map_err(|e| format!("failed to create block '{}': {e}", event.title))?;

        println!("  ✓ Created: {} ({})", event.title, block.title);
    }
    Ok(())
}
