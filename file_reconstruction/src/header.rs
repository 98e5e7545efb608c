use serde::Deserialize;

/// A decoded file header as stored in a root record's payload.
///
/// Small files embed their whole content in `data` (base64); large files
/// instead carry an ordered `chunks` list whose payloads concatenate to the
/// file. The on-ledger field name for the chunk size is `chuncksize`, a
/// spelling the persisted format is stuck with.
#[derive(Debug, Clone, Deserialize)]
pub struct FileHeader {
    pub filename: Option<String>,
    pub mime: Option<String>,
    pub size: u64,
    #[serde(rename = "chuncksize")]
    pub chunk_size: Option<u64>,
    #[serde(default)]
    pub chunks: Vec<String>,
    pub data: Option<String>,
}

/// Whether a file lives in its root record or across chunk records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Single,
    Multiple,
}

/// Read-only descriptor derived from a file header; computed fresh on every
/// request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStats {
    pub size: u64,
    pub chunk_size: Option<u64>,
    pub filename: Option<String>,
    pub mime: Option<String>,
    pub kind: FileKind,
}

impl FileHeader {
    /// A header is a single-record file iff it carries inline data.
    pub fn kind(&self) -> FileKind {
        if self.data.is_some() {
            FileKind::Single
        } else {
            FileKind::Multiple
        }
    }

    pub fn stats(&self) -> FileStats {
        FileStats {
            size: self.size,
            chunk_size: self.chunk_size,
            filename: self.filename.clone(),
            mime: self.mime.clone(),
            kind: self.kind(),
        }
    }
}
