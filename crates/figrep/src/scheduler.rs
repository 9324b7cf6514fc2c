//! Cron-driven run loop

use std::str::FromStr;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use libfigrep_core::FigrepError;
use tracing::{error, info};

/// Accept classic 5-field expressions: imply second 0 and renumber weekdays.
///
/// 6- and 7-field expressions are passed through in the cron crate's own
/// dialect.
pub fn normalize_expression(expr: &str) -> String {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    match fields.as_slice() {
        [minute, hour, day, month, weekday] => format!(
            "0 {} {} {} {} {}",
            minute,
            hour,
            day,
            month,
            classic_weekdays(weekday)
        ),
        _ => fields.join(" "),
    }
}

/// Classic cron counts weekdays 0-7 from Sunday (7 is Sunday again); the cron
/// crate counts 1-7 from Sunday. Names, `*` and `?` need no change.
fn classic_weekdays(field: &str) -> String {
    field.split(',').map(classic_weekday_item).collect::<Vec<_>>().join(",")
}

fn classic_weekday_item(item: &str) -> String {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (item, None),
    };
    let suffix = step.map(|s| format!("/{}", s)).unwrap_or_default();

    if let Some((start, end)) = base.split_once('-') {
        return match (start.parse::<u32>(), end.parse::<u32>()) {
            (Ok(start), Ok(end)) if start <= 6 && end <= 7 => {
                if end == 7 && start > 0 {
                    // Sunday moves to the front, so a range ending on it splits in two
                    let every = step.and_then(|s| s.parse::<u32>().ok()).unwrap_or(1).max(1);
                    let head = format!("{}-7{}", start + 1, suffix);
                    if (7 - start) % every == 0 {
                        format!("{},1", head)
                    } else {
                        head
                    }
                } else {
                    format!("{}-{}{}", start + 1, end.min(6) + 1, suffix)
                }
            }
            _ => item.to_string(),
        };
    }

    match base.parse::<u32>() {
        Ok(day) if day <= 7 => format!("{}{}", day % 7 + 1, suffix),
        // out of range either way, leave it for the parser to reject
        _ => item.to_string(),
    }
}

pub fn parse_schedule(expr: &str) -> Result<Schedule, FigrepError> {
    Schedule::from_str(&normalize_expression(expr))
        .map_err(|e| FigrepError::Schedule(format!("{:?}: {}", expr, e)))
}

/// First fire time strictly after `after`
pub fn next_fire<Tz: TimeZone>(schedule: &Schedule, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    schedule.after(after).next()
}

/// Sleep until each fire time and run `job`. A failing job is logged and the
/// loop continues; only an exhausted schedule ends it.
pub fn run_forever<F>(schedule: &Schedule, mut job: F) -> Result<(), FigrepError>
where
    F: FnMut() -> Result<(), FigrepError>,
{
    loop {
        let now = Local::now();
        let next = next_fire(schedule, &now)
            .ok_or_else(|| FigrepError::Schedule("schedule has no upcoming fire time".to_string()))?;
        let wait = (next.clone() - now).to_std().unwrap_or(Duration::ZERO);
        info!(next = %next.to_rfc3339(), "waiting for next run");
        thread::sleep(wait);

        match job() {
            Ok(()) => info!("scheduled run finished"),
            Err(e) => error!(error = %e, "scheduled run failed"),
        }
    }
}
