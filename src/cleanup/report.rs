use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum DropOutcome {
    Dropped,
    /// Left alone without issuing DDL; the record stays pending.
    Skipped(String),
    /// The database rejected the detach or drop; the record stays pending.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropEntry {
    pub table_name: String,
    pub partition_name: String,
    pub outcome: DropOutcome,
}

/// Per-partition results of one drop sweep, in the order they were tried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DropReport {
    pub entries: Vec<DropEntry>,
}

impl DropReport {
    pub fn push(&mut self, table_name: &str, partition_name: &str, outcome: DropOutcome) {
        self.entries.push(DropEntry {
            table_name: table_name.to_string(),
            partition_name: partition_name.to_string(),
            outcome,
        });
    }

    pub fn dropped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == DropOutcome::Dropped)
            .count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &DropEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, DropOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> impl Iterator<Item = &DropEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, DropOutcome::Failed(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_outcome() {
        let mut report = DropReport::default();
        report.push("orders", "orders_a", DropOutcome::Dropped);
        report.push("orders", "orders_b", DropOutcome::Failed("locked".into()));
        report.push("orders", "orders_c", DropOutcome::Skipped("has rows".into()));
        report.push("events", "events_a", DropOutcome::Dropped);

        assert_eq!(report.dropped(), 2);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.skipped().next().unwrap().partition_name, "orders_c");
    }

    #[test]
    fn test_outcome_json() {
        let json = serde_json::to_value(DropOutcome::Failed("no such table".into())).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "no such table");
        let json = serde_json::to_value(DropOutcome::Dropped).unwrap();
        assert_eq!(json["status"], "dropped");
    }
}
