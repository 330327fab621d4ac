use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SweepError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Schedule error: {0}")]
    ScheduleError(String),
    #[error("Transaction already committed or rolled back")]
    TransactionClosed,
}

impl From<std::io::Error> for SweepError {
    fn from(err: std::io::Error) -> Self {
        SweepError::IoError(err.to_string())
    }
}

impl From<tokio_postgres::Error> for SweepError {
    fn from(err: tokio_postgres::Error) -> Self {
        // The plain Display of a server error is just "db error".
        match err.as_db_error() {
            Some(db) => SweepError::DatabaseError(format!("{}: {}", db.code().code(), db.message())),
            None => SweepError::DatabaseError(err.to_string()),
        }
    }
}

impl From<deadpool_postgres::PoolError> for SweepError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        SweepError::DatabaseError(format!("connection pool: {err}"))
    }
}

impl From<deadpool_postgres::CreatePoolError> for SweepError {
    fn from(err: deadpool_postgres::CreatePoolError) -> Self {
        SweepError::ConfigParsingError(format!("connection pool: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let err: SweepError = std::io::Error::other("disk gone").into();
        assert_eq!(err, SweepError::IoError("disk gone".to_string()));
    }

    #[test]
    fn test_display() {
        let err = SweepError::InvalidIdentifier("empty name".to_string());
        assert_eq!(err.to_string(), "Invalid identifier: empty name");
        assert_eq!(
            SweepError::TransactionClosed.to_string(),
            "Transaction already committed or rolled back"
        );
    }
}
