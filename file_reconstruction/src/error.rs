use thiserror::Error;

/// Errors that can occur while reconstructing a file from ledger records.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FileReconstructionError {
    #[error("ledger lookup failed: {0}")]
    Ledger(#[from] ledger_client::LedgerClientError),

    #[error("record {record_id} has no data output")]
    NoDataOutput { record_id: String },

    #[error("record {record_id} is not a standard {label} payload")]
    NotStandardPayload { record_id: String, label: &'static str },

    #[error("payload is not a valid {label} header: {source}")]
    Decode {
        label: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("payload is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("inline file data is not valid base64: {0}")]
    InlineData(#[from] base64::DecodeError),

    #[error("malformed chunk reference: {0}")]
    MalformedChunkRef(String),

    #[error("file header carries no usable chunk size")]
    MissingChunkSize,

    #[error("read offset {from} is past the end of a {size} byte file")]
    InvalidRange { from: u64, size: u64 },
}

pub type Result<T> = std::result::Result<T, FileReconstructionError>;
