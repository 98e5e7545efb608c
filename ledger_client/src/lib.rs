mod error;
mod record;
mod rpc;

pub mod test_utils;

pub use error::{LedgerClientError, Result};
pub use record::{DATA_OUTPUT_TYPE, LedgerRecord, OutputScript, RecordOutput, RecordSource};
pub use rpc::RpcClient;
