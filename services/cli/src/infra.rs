use chrono::{DateTime, Duration, Utc};
use mlm_rewards::error::AppError;
use serde::Serialize;
use std::io::Write;

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

pub(crate) fn parse_hours(raw: &str) -> Result<Duration, String> {
    match raw.trim().parse::<i64>() {
        Ok(hours) if hours >= 0 => Duration::try_hours(hours)
            .ok_or_else(|| format!("'{raw}' hours is too long a delay")),
        _ => Err(format!("'{raw}' is not a non-negative number of hours")),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)?;
    writeln!(handle)?;
    Ok(())
}
