use crate::config::TimeMode;
use std::time::{SystemTime, UNIX_EPOCH};
use time::format_description::{parse_owned, OwnedFormatItem};
use time::OffsetDateTime;

const DEFAULT_ABSOLUTE_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]";

/// Formats backup modification times
#[derive(Debug, Clone)]
pub struct TimeFormatter {
    mode: TimeMode,
    absolute_format: Option<OwnedFormatItem>,
}

impl Default for TimeFormatter {
    fn default() -> Self {
        Self::new(TimeMode::default())
    }
}

impl TimeFormatter {
    pub fn new(mode: TimeMode) -> Self {
        Self {
            mode,
            absolute_format: parse_owned::<2>(DEFAULT_ABSOLUTE_FORMAT).ok(),
        }
    }

    pub fn format(&self, epoch: Option<i64>, now: i64) -> String {
        let Some(epoch) = epoch else {
            return "unknown".to_string();
        };
        match (self.mode, &self.absolute_format) {
            (TimeMode::Absolute, Some(format)) => {
                format_absolute(epoch, format).unwrap_or_else(|| "unknown".to_string())
            }
            _ => format_relative_age(epoch, now),
        }
    }

    /// Modification time of `path`, formatted relative to now
    pub fn format_modified(&self, path: &std::path::Path) -> String {
        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        self.format(modified.and_then(epoch_secs), now_secs())
    }
}

pub fn epoch_secs(time: SystemTime) -> Option<i64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
}

pub fn now_secs() -> i64 {
    epoch_secs(SystemTime::now()).unwrap_or(0)
}

fn format_absolute(epoch: i64, format: &OwnedFormatItem) -> Option<String> {
    let date_time = OffsetDateTime::from_unix_timestamp(epoch).ok()?;
    date_time.format(format).ok()
}

/// Backups are often minutes apart, so this goes finer than days
pub fn format_relative_age(epoch: i64, now: i64) -> String {
    let age_secs = now.saturating_sub(epoch).max(0);
    if age_secs < 60 {
        return "just now".to_string();
    }
    let minutes = age_secs / 60;
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }
    let days = hours / 24;
    if days < 30 {
        return plural(days, "day");
    }
    if days < 365 {
        return plural((days / 30).max(1), "month");
    }
    plural(days / 365, "year")
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
