use serde::Deserialize;

use crate::error::Result;

/// Output-type tag marking an unspendable script used purely to embed payload
/// bytes.
pub const DATA_OUTPUT_TYPE: &str = "nulldata";

/// An immutable ledger record with its ordered outputs, as returned by the
/// node's verbose record lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerRecord {
    #[serde(rename = "txid")]
    pub id: String,
    #[serde(rename = "vout")]
    pub outputs: Vec<RecordOutput>,
}

/// One output slot of a ledger record.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordOutput {
    #[serde(rename = "n")]
    pub index: u32,
    #[serde(default)]
    pub value: f64,
    #[serde(rename = "scriptPubKey", default)]
    pub script: Option<OutputScript>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputScript {
    pub hex: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl LedgerRecord {
    /// Looks up an output by its explicit index.
    pub fn output(&self, index: u32) -> Option<&RecordOutput> {
        self.outputs.iter().find(|out| out.index == index)
    }

    /// The first output tagged as a data output, if any.
    pub fn first_data_output(&self) -> Option<&RecordOutput> {
        self.outputs.iter().find(|out| out.is_data())
    }
}

impl RecordOutput {
    pub fn is_data(&self) -> bool {
        self.script.as_ref().is_some_and(|script| script.kind == DATA_OUTPUT_TYPE)
    }
}

/// Resolves a record identifier to its raw structure. Implementations perform
/// a fresh lookup on every call; nothing is cached or retried.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_record(&self, id: &str) -> Result<LedgerRecord>;
}
