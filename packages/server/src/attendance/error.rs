use sea_orm::DbErr;
use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(msg) => AppError::NotFound(msg),
            LedgerError::Validation(msg) => AppError::Validation(msg),
            LedgerError::Db(e) => AppError::from(e),
        }
    }
}
