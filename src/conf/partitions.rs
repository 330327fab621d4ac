use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartitionsConfig {
    /// The only schema whose partitions are inspected and dropped.
    #[serde(default = "PartitionsConfig::default_schema")]
    pub target_schema: String,
    /// Schema holding `table_list` and `empty_partitions`.
    #[serde(default = "PartitionsConfig::default_schema")]
    pub tracking_schema: String,
}

impl PartitionsConfig {
    fn default_schema() -> String {
        String::from("public")
    }
}

impl Default for PartitionsConfig {
    fn default() -> Self {
        Self {
            target_schema: Self::default_schema(),
            tracking_schema: Self::default_schema(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CleanupConfig {
    /// Lock each partition and count its rows again right before detaching it.
    #[serde(default = "CleanupConfig::default_recheck")]
    pub recheck_before_drop: bool,
}

impl CleanupConfig {
    fn default_recheck() -> bool {
        true
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            recheck_before_drop: Self::default_recheck(),
        }
    }
}
