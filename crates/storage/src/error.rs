use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Maps Postgres integrity errors (SQLSTATE class 23) to `ConstraintViolation`,
    /// everything else stays a plain database error.
    pub fn from_write(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(e) if e.code().is_some_and(|code| code.starts_with("23")) => {
                Self::ConstraintViolation(e.message().to_string())
            }
            _ => Self::Database(error),
        }
    }
}
