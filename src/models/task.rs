use std::time::Duration;

pub const SIZE_XS: Duration = Duration::from_secs(10 * 60);
pub const SIZE_S: Duration = Duration::from_secs(15 * 60);
pub const SIZE_M: Duration = Duration::from_secs(30 * 60);
pub const SIZE_L: Duration = Duration::from_secs(60 * 60);
pub const SIZE_XL: Duration = Duration::from_secs(90 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub title: String,
    pub duration: Duration,
}

/// Parses a comma-separated task list like "Write docs:L, Review PRs:S".
/// Empty segments are dropped, order is preserved, and this never fails:
/// anything unparseable just becomes a medium-sized task with the raw
/// segment as its title.
pub fn parse_task_list(input: &str) -> Vec<Task> {
    input
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (title, duration) = parse_task(segment);
            Task { title, duration }
        })
        .collect()
}

fn parse_task(segment: &str) -> (String, Duration) {
    let Some((title, code)) = segment.split_once(':') else {
        return (segment.to_string(), SIZE_M);
    };

    match size_for_code(code.trim()) {
        Some(duration) => (title.trim().to_string(), duration),
        // Unknown size code: keep the whole segment, ":CODE" included, so
        // the user's literal text is not silently stripped.
        None => (segment.to_string(), SIZE_M),
    }
}

fn size_for_code(code: &str) -> Option<Duration> {
    match code.to_ascii_uppercase().as_str() {
        "XS" => Some(SIZE_XS),
        "S" => Some(SIZE_S),
        "M" => Some(SIZE_M),
        "L" => Some(SIZE_L),
        "XL" => Some(SIZE_XL),
        _ => None,
    }
}
