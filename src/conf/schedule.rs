use serde::{Deserialize, Serialize};

/// Six-field cron expressions (`sec min hour day month weekday`), local time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    #[serde(default = "ScheduleConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "ScheduleConfig::default_identify")]
    pub identify: String,
    #[serde(default = "ScheduleConfig::default_drop")]
    pub drop: String,
}

impl ScheduleConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_identify() -> String {
        String::from("0 0 1 * * *")
    }

    fn default_drop() -> String {
        String::from("0 0 2 * * Sun")
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            identify: Self::default_identify(),
            drop: Self::default_drop(),
        }
    }
}
