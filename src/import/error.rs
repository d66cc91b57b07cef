use thiserror::Error;

use crate::auth::AuthError;

/// Failures that abort a whole import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("administrator privilege required")]
    AccessDenied,
    #[error("upload is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
    #[error("database unavailable: {0}")]
    Database(#[from] sqlx::Error),
    #[error("import aborted at line {line}: {source}")]
    Aborted { line: usize, source: RowError },
}

/// Failures confined to a single row. The row is rolled back and reported.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("unknown country '{0}'")]
    UnknownCountry(String),
    #[error("malformed line: {0}")]
    Malformed(#[from] csv::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for RowError {
    fn from(err: AuthError) -> Self {
        RowError::PasswordHash(err.to_string())
    }
}

impl RowError {
    /// Whether this failure means the database itself is unusable, in which
    /// case continuing with later rows is pointless.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            RowError::Database(
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connection_errors_abort() {
        assert!(RowError::Database(sqlx::Error::PoolClosed).is_connection_failure());
        assert!(RowError::Database(sqlx::Error::PoolTimedOut).is_connection_failure());
        assert!(!RowError::Database(sqlx::Error::RowNotFound).is_connection_failure());
        assert!(!RowError::UnknownCountry("Atlantis".into()).is_connection_failure());
        assert!(!RowError::FieldCount { expected: 15, found: 3 }.is_connection_failure());
    }
}
