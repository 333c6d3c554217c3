use std::fmt;

use thiserror::Error;

use crate::db::DatabaseError;

/// What a failed load was trying to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Table(&'static str),
    Row { table: &'static str, key: u64 },
}

impl fmt::Display for LoadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadTarget::Table(table) => write!(f, "table {table}"),
            LoadTarget::Row { table, key } => write!(f, "{table} row {key}"),
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to load {target}: {source}")]
pub struct PersistenceError {
    pub target: LoadTarget,
    #[source]
    pub source: DatabaseError,
}

impl PersistenceError {
    pub(crate) fn table(table: &'static str) -> impl FnOnce(DatabaseError) -> Self {
        move |source| Self {
            target: LoadTarget::Table(table),
            source,
        }
    }

    pub(crate) fn row(table: &'static str, key: u64) -> impl FnOnce(DatabaseError) -> Self {
        move |source| Self {
            target: LoadTarget::Row { table, key },
            source,
        }
    }
}
