use crate::core::{Ident, qualified};

pub const LIST_BASE_TABLES: &str = "\
SELECT table_name::text
FROM information_schema.tables
WHERE table_schema = $1 AND table_type = 'BASE TABLE'
ORDER BY table_name";

pub const HAS_PARTITIONS: &str = "\
SELECT EXISTS (
    SELECT 1
    FROM pg_inherits i
    JOIN pg_class c ON c.oid = i.inhparent
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = $1 AND c.relname = $2
)";

// Children outside the parent's schema are left alone.
pub const LIST_CHILD_PARTITIONS: &str = "\
SELECT c.relname::text AS partition_name
FROM pg_inherits i
JOIN pg_class p ON p.oid = i.inhparent
JOIN pg_class c ON c.oid = i.inhrelid
JOIN pg_namespace n ON n.oid = p.relnamespace
JOIN pg_namespace cn ON cn.oid = c.relnamespace
WHERE n.nspname = $1 AND p.relname = $2 AND cn.nspname = $1
ORDER BY c.relname";

pub const ADVISORY_XACT_LOCK: &str = "SELECT pg_advisory_xact_lock($1)";

pub const PROBE_SAVEPOINT: &str = "SAVEPOINT row_probe";
pub const RELEASE_PROBE: &str = "RELEASE SAVEPOINT row_probe";
pub const ROLLBACK_PROBE: &str = "ROLLBACK TO SAVEPOINT row_probe";

pub fn count_rows(schema: &Ident, relation: &Ident) -> String {
    format!("SELECT count(*) FROM {}", qualified(schema, relation))
}

pub fn lock_table(schema: &Ident, table: &Ident) -> String {
    format!(
        "LOCK TABLE {} IN ACCESS EXCLUSIVE MODE",
        qualified(schema, table)
    )
}

pub fn detach_partition(schema: &Ident, parent: &Ident, partition: &Ident) -> String {
    format!(
        "ALTER TABLE {} DETACH PARTITION {}",
        qualified(schema, parent),
        qualified(schema, partition)
    )
}

pub fn drop_table(schema: &Ident, table: &Ident) -> String {
    format!("DROP TABLE {}", qualified(schema, table))
}

/// Statements against `table_list` and `empty_partitions` in the tracking
/// schema, rendered once per database handle.
#[derive(Debug, Clone)]
pub struct TrackingSql {
    pub insert_table: String,
    pub list_partitioned_tables: String,
    pub insert_empty_partition: String,
    pub list_pending_drops: String,
    pub mark_dropped: String,
}

impl TrackingSql {
    pub fn new(tracking_schema: &Ident) -> Self {
        let s = tracking_schema.quoted();
        Self {
            insert_table: format!(
                "INSERT INTO {s}.table_list (table_name, table_schema, has_partitions) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (table_name, table_schema) DO NOTHING \
                 RETURNING id"
            ),
            list_partitioned_tables: format!(
                "SELECT id, table_name, table_schema, has_partitions \
                 FROM {s}.table_list \
                 WHERE table_schema = $1 AND has_partitions \
                 ORDER BY table_name"
            ),
            insert_empty_partition: format!(
                "INSERT INTO {s}.empty_partitions (table_name, partition_name, identified_at, is_dropped) \
                 VALUES ($1, $2, now(), false) \
                 ON CONFLICT (table_name, partition_name) DO NOTHING \
                 RETURNING id"
            ),
            list_pending_drops: format!(
                "SELECT id, table_name, partition_name, identified_at, is_dropped, dropped_at \
                 FROM {s}.empty_partitions \
                 WHERE NOT is_dropped \
                 ORDER BY identified_at, id"
            ),
            mark_dropped: format!(
                "UPDATE {s}.empty_partitions \
                 SET is_dropped = true, dropped_at = now() \
                 WHERE id = $1 AND NOT is_dropped \
                 RETURNING dropped_at"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Ident {
        Ident::new(name).unwrap()
    }

    #[test]
    fn test_ddl_is_schema_qualified_and_quoted() {
        let schema = ident("CADS");
        assert_eq!(
            detach_partition(&schema, &ident("orders"), &ident("orders_2024_01")),
            "ALTER TABLE \"CADS\".\"orders\" DETACH PARTITION \"CADS\".\"orders_2024_01\""
        );
        assert_eq!(
            drop_table(&schema, &ident("orders_2024_01")),
            "DROP TABLE \"CADS\".\"orders_2024_01\""
        );
        assert_eq!(
            count_rows(&schema, &ident("we\"ird")),
            "SELECT count(*) FROM \"CADS\".\"we\"\"ird\""
        );
    }

    #[test]
    fn test_tracking_sql_uses_tracking_schema() {
        let sql = TrackingSql::new(&ident("ops"));
        assert!(sql.insert_table.starts_with("INSERT INTO \"ops\".table_list"));
        assert!(sql.list_pending_drops.contains("FROM \"ops\".empty_partitions"));
        assert!(sql.mark_dropped.contains("AND NOT is_dropped"));
    }
}
