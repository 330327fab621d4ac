use std::fmt;

use super::SweepError;

/// Longest identifier PostgreSQL keeps without truncation (NAMEDATALEN - 1).
const MAX_IDENT_BYTES: usize = 63;

/// A schema, table or partition name that is safe to splice into SQL text.
///
/// Catalog and DDL statements cannot bind relation names as parameters, so
/// every name that ends up in statement text goes through this type: it is
/// validated once and always rendered double-quoted with embedded quotes
/// doubled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: &str) -> Result<Self, SweepError> {
        if name.is_empty() {
            return Err(SweepError::InvalidIdentifier("empty name".to_string()));
        }
        if name.len() > MAX_IDENT_BYTES {
            return Err(SweepError::InvalidIdentifier(format!(
                "'{name}' is longer than {MAX_IDENT_BYTES} bytes"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(SweepError::InvalidIdentifier(format!(
                "{name:?} contains control characters"
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0.replace('"', "\"\""))
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `"schema"."name"`
pub fn qualified(schema: &Ident, name: &Ident) -> String {
    format!("{}.{}", schema.quoted(), name.quoted())
}
