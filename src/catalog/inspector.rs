use log::debug;

use crate::core::{Ident, SweepError};

use super::CatalogReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTable {
    pub name: String,
    pub has_partitions: bool,
}

/// Lists every base table in `schema` along with whether it is a
/// partitioned parent. Any query error aborts the listing.
pub async fn discover_tables<R>(
    reader: &mut R,
    schema: &Ident,
) -> Result<Vec<DiscoveredTable>, SweepError>
where
    R: CatalogReader + ?Sized,
{
    let names = reader.list_base_tables(schema).await?;
    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let has_partitions = reader.has_partitions(schema, &name).await?;
        debug!("table {schema}.{name}: has_partitions={has_partitions}");
        tables.push(DiscoveredTable {
            name,
            has_partitions,
        });
    }
    Ok(tables)
}
