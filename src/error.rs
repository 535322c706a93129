use crate::db::DbError;

/// Why a repository call did not succeed.
///
/// `Display` yields the message the legacy response records carry, so
/// flattening into `{ success: false, message }` is just `to_string()`.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Connection, driver or row-decoding failure.
    #[error("An error occurred: {0}")]
    Infrastructure(#[from] DbError),
    /// The procedure refused the request and said why.
    #[error("{0}")]
    Rejected(String),
}

impl RepositoryError {
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, RepositoryError::Infrastructure(_))
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
