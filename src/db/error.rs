use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(String),
    #[error("database query error: {0}")]
    Query(String),
    #[error("database migration error: {0}")]
    Migration(String),
    #[error("malformed {table}.{column} value {value}")]
    Decode {
        table: &'static str,
        column: &'static str,
        value: i64,
    },
    #[error("{table}.{column} value {value} does not fit a BIGINT column")]
    Encode {
        table: &'static str,
        column: &'static str,
        value: u64,
    },
}
