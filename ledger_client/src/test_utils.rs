//! In-memory ledger fixtures for tests.
//!
//! `MemoryLedger` stands in for the RPC client so the reconstruction and
//! serving layers can be exercised against prebuilt records.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{LedgerClientError, Result};
use crate::record::{DATA_OUTPUT_TYPE, LedgerRecord, OutputScript, RecordOutput, RecordSource};

/// A `RecordSource` backed by an in-memory map of records.
#[derive(Default)]
pub struct MemoryLedger {
    records: RwLock<HashMap<String, LedgerRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: LedgerRecord) {
        self.records.write().unwrap().insert(record.id.clone(), record);
    }
}

#[async_trait::async_trait]
impl RecordSource for MemoryLedger {
    async fn fetch_record(&self, id: &str) -> Result<LedgerRecord> {
        self.records
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerClientError::RecordNotFound {
                id: id.to_string(),
                message: "not in ledger".to_string(),
            })
    }
}

/// Builds the script hex of a data output: return marker, pushdata framing,
/// an optional ascii tag, then the payload. Length fields are little-endian
/// as on the wire.
pub fn data_script_hex(payload: &[u8], tag: Option<&str>) -> String {
    let mut body = Vec::new();
    if let Some(tag) = tag {
        body.extend_from_slice(tag.as_bytes());
    }
    body.extend_from_slice(payload);

    let framing = match body.len() {
        len if len <= 0xff => format!("4c{:02x}", len as u8),
        len if len <= 0xffff => format!("4d{:04x}", (len as u16).swap_bytes()),
        len => format!("4e{:08x}", (len as u32).swap_bytes()),
    };
    format!("006a{framing}{}", hex::encode(body))
}

/// A data output carrying a framed payload at the given output index.
pub fn data_output(index: u32, payload: &[u8], tag: Option<&str>) -> RecordOutput {
    RecordOutput {
        index,
        value: 0.0,
        script: Some(OutputScript {
            hex: data_script_hex(payload, tag),
            kind: DATA_OUTPUT_TYPE.to_string(),
        }),
    }
}

/// A spendable value output, never selected as a data output.
pub fn value_output(index: u32) -> RecordOutput {
    RecordOutput {
        index,
        value: 0.0001,
        script: Some(OutputScript {
            hex: "76a914000000000000000000000000000000000000000088ac".to_string(),
            kind: "pubkeyhash".to_string(),
        }),
    }
}

pub fn record(id: &str, outputs: Vec<RecordOutput>) -> LedgerRecord {
    LedgerRecord {
        id: id.to_string(),
        outputs,
    }
}
