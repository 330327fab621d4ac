use log::{debug, warn};

use crate::core::{Ident, SweepError};

use super::CatalogReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Empty,
    NonEmpty(i64),
    /// The row count could not be taken, e.g. the partition vanished after
    /// it was listed. Skipped for this cycle.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionProbe {
    pub name: String,
    pub outcome: ProbeOutcome,
}

pub async fn is_empty<R>(reader: &mut R, schema: &Ident, partition: &Ident) -> Result<bool, SweepError>
where
    R: CatalogReader + ?Sized,
{
    Ok(reader.count_rows(schema, partition).await? == 0)
}

/// Lists the children of `parent` and counts the rows of each one.
///
/// Failing to list the children is an error; failing to probe a single
/// child only marks that child `Unavailable`.
pub async fn probe_partitions<R>(
    reader: &mut R,
    schema: &Ident,
    parent: &Ident,
) -> Result<Vec<PartitionProbe>, SweepError>
where
    R: CatalogReader + ?Sized,
{
    let children = reader.list_child_partitions(schema, parent.as_str()).await?;
    let mut probes = Vec::with_capacity(children.len());

    for name in children {
        let outcome = match Ident::new(&name) {
            Err(e) => ProbeOutcome::Unavailable(e.to_string()),
            Ok(ident) => match reader.count_rows(schema, &ident).await {
                Ok(0) => ProbeOutcome::Empty,
                Ok(rows) => ProbeOutcome::NonEmpty(rows),
                Err(e) => ProbeOutcome::Unavailable(e.to_string()),
            },
        };

        match &outcome {
            ProbeOutcome::Unavailable(reason) => {
                warn!("skipping partition {schema}.{name} of {parent}: {reason}")
            }
            ProbeOutcome::NonEmpty(rows) => debug!("partition {schema}.{name} has {rows} rows"),
            ProbeOutcome::Empty => debug!("partition {schema}.{name} is empty"),
        }

        probes.push(PartitionProbe { name, outcome });
    }

    Ok(probes)
}
