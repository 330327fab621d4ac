use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local};
use cron::Schedule;

use crate::core::SweepError;

/// A named cron expression evaluated in local time.
#[derive(Debug, Clone)]
pub struct CronJob {
    name: &'static str,
    schedule: Schedule,
}

impl CronJob {
    pub fn parse(name: &'static str, expression: &str) -> Result<Self, SweepError> {
        let schedule = Schedule::from_str(expression).map_err(|e| {
            SweepError::ScheduleError(format!("invalid cron expression '{expression}': {e}"))
        })?;
        Ok(Self { name, schedule })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn next_after(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(&now).next()
    }

    /// Time to wait from `now` until the next firing.
    pub fn delay_from(&self, now: DateTime<Local>) -> Option<Duration> {
        let next = self.next_after(now)?;
        Some((next - now).to_std().unwrap_or(Duration::ZERO))
    }
}
