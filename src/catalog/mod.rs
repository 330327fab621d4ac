//! Read-only inspection of PostgreSQL catalogs for the target schema.

mod enumerator;
mod inspector;

use async_trait::async_trait;

use crate::core::{Ident, SweepError};

pub use enumerator::{PartitionProbe, ProbeOutcome, is_empty, probe_partitions};
pub use inspector::{DiscoveredTable, discover_tables};

/// Catalog queries. Relation names are passed as bound parameters; only
/// `count_rows` needs a quoted name in statement text.
#[async_trait]
pub trait CatalogReader: Send {
    /// Base tables in `schema` (`information_schema.tables`), by name.
    async fn list_base_tables(&mut self, schema: &Ident) -> Result<Vec<String>, SweepError>;

    /// True iff `pg_inherits` has at least one child of `table` in `schema`.
    async fn has_partitions(&mut self, schema: &Ident, table: &str) -> Result<bool, SweepError>;

    /// Children of `parent` that live in `schema`, by name.
    async fn list_child_partitions(
        &mut self,
        schema: &Ident,
        parent: &str,
    ) -> Result<Vec<String>, SweepError>;

    /// `SELECT count(*)` on the relation. A failure leaves the enclosing
    /// transaction usable.
    async fn count_rows(&mut self, schema: &Ident, relation: &Ident) -> Result<i64, SweepError>;
}
