use thiserror::Error;

/// Errors surfaced by ledger record lookups.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LedgerClientError {
    #[error("record {id} not found: {message}")]
    RecordNotFound { id: String, message: String },

    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error response: {0}")]
    Rpc(String),
}

pub type Result<T> = std::result::Result<T, LedgerClientError>;
