pub mod config;
pub mod core;
pub mod history;
pub mod history_cmd;
pub mod storage;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// Malformed snapshot or observation; aborts the whole reconciliation.
    #[error("validation error: {0}")]
    Validation(String),
    #[error("could not mint a free artist identifier after {attempts} attempts")]
    IdentifierExhaustion { attempts: usize },
    #[error("{0}")]
    Message(String),
}

pub type HistoryResult<T> = Result<T, HistoryError>;
