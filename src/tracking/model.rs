use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A base table seen in the target schema. Never updated once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedTable {
    pub id: i64,
    pub table_name: String,
    pub schema_name: String,
    pub has_partitions: bool,
}

/// A child partition that held zero rows when it was probed.
///
/// `dropped_at` is set exactly when `is_dropped` is, and a dropped record
/// never goes back to pending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEmptyPartition {
    pub id: i64,
    pub table_name: String,
    pub partition_name: String,
    pub identified_at: DateTime<Utc>,
    pub is_dropped: bool,
    pub dropped_at: Option<DateTime<Utc>>,
}

impl TrackedEmptyPartition {
    pub fn mark_dropped(&mut self, at: DateTime<Utc>) {
        self.is_dropped = true;
        self.dropped_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_serializes_camel_case() {
        let record = TrackedEmptyPartition {
            id: 7,
            table_name: "orders".to_string(),
            partition_name: "orders_2024_01".to_string(),
            identified_at: Utc.with_ymd_and_hms(2024, 1, 14, 1, 0, 0).unwrap(),
            is_dropped: false,
            dropped_at: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["tableName"], "orders");
        assert_eq!(json["partitionName"], "orders_2024_01");
        assert_eq!(json["identifiedAt"], "2024-01-14T01:00:00Z");
        assert_eq!(json["isDropped"], false);
        assert!(json["droppedAt"].is_null());
    }

    #[test]
    fn test_mark_dropped_sets_both_fields() {
        let mut record = TrackedEmptyPartition {
            id: 1,
            table_name: "t".to_string(),
            partition_name: "t_p".to_string(),
            identified_at: Utc::now(),
            is_dropped: false,
            dropped_at: None,
        };
        let at = Utc.with_ymd_and_hms(2024, 1, 21, 2, 0, 0).unwrap();
        record.mark_dropped(at);
        assert!(record.is_dropped);
        assert_eq!(record.dropped_at, Some(at));
    }
}
