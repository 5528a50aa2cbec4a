use sea_orm::DbErr;
use thiserror::Error;

/// Failures surfaced by the herd read models.
///
/// The read models never recover locally: every variant is handed back to the
/// caller as-is so the HTTP layer can tell "missing" from "broken".
#[derive(Error, Debug)]
pub enum HerdError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Failed to retrieve herd records: {0}")]
    Retrieval(#[from] DbErr),
}

impl HerdError {
    pub fn cattle_not_found(id: i32) -> Self {
        HerdError::NotFound(format!("Cattle {} not found", id))
    }
}

pub type HerdResult<T> = Result<T, HerdError>;
