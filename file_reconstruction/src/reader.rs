use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use ledger_client::{LedgerRecord, RecordSource};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::error::{FileReconstructionError, Result};
use crate::header::{FileHeader, FileKind, FileStats};
use crate::payload::extract_payload;

/// Bounded depth of the chunk-to-transport channel. A slow transport fills
/// the channel and suspends further chunk fetches until it drains.
const STREAM_CHANNEL_CAPACITY: usize = 4;

/// Ordered reconstructed byte buffers, delivered as chunks are fetched.
pub type ByteStream = ReceiverStream<Result<Bytes>>;

/// A ledger encoding variant: the ascii tag that may prefix payloads and the
/// label used in error messages. The engine itself is variant-agnostic.
#[derive(Debug, Clone)]
pub struct EncodingProfile {
    label: &'static str,
    tag_hex: String,
}

impl EncodingProfile {
    pub fn new(label: &'static str, ascii_tag: &str) -> Self {
        Self {
            label,
            tag_hex: hex::encode(ascii_tag),
        }
    }

    /// The profile current uploads are published with.
    pub fn upfile() -> Self {
        Self::new("upfile", "upfile ")
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// Reconstructs files from ledger records and serves byte windows of them.
///
/// Every operation re-reads the ledger; no record or file data is cached
/// across calls.
#[derive(Clone)]
pub struct FileReader {
    source: Arc<dyn RecordSource>,
    profile: EncodingProfile,
}

impl FileReader {
    pub fn new(source: Arc<dyn RecordSource>, profile: EncodingProfile) -> Self {
        Self { source, profile }
    }

    /// Fetches the root record and derives the file descriptor.
    pub async fn stats(&self, root_id: &str) -> Result<FileStats> {
        let record = self.source.fetch_record(root_id).await?;
        Ok(self.decode_header(&record)?.stats())
    }

    /// Emits the byte window `[from, from + length)` of the file rooted at
    /// `root_id` as an ordered stream of buffers.
    ///
    /// `length` defaults to the declared file size. Chunk records are fetched
    /// lazily, one at a time, in ascending order; a failed fetch aborts the
    /// stream with the error in place of the next buffer. Running out of
    /// chunks before `length` is satisfied ends the stream early (a short
    /// read, not an error).
    pub async fn read(&self, root_id: &str, from: u64, length: Option<u64>) -> Result<ByteStream> {
        let record = self.source.fetch_record(root_id).await?;
        let header = self.decode_header(&record)?;
        let length = length.unwrap_or(header.size);

        match header.kind() {
            FileKind::Single => self.read_inline(&header, from, length),
            FileKind::Multiple => self.read_chunked(header, from, length),
        }
    }

    fn read_inline(&self, header: &FileHeader, from: u64, mut length: u64) -> Result<ByteStream> {
        let size = header.size;
        if from > size {
            return Err(FileReconstructionError::InvalidRange { from, size });
        }
        // A request past the declared size degenerates to an empty read.
        if length > size - from {
            length = 0;
        }

        let buffer = BASE64.decode(header.data.as_deref().unwrap_or_default())?;
        let window = slice_window(buffer, from, length);

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        if !window.is_empty() {
            // A fresh channel always has room for the first buffer.
            let _ = tx.try_send(Ok(window));
        }
        Ok(ReceiverStream::new(rx))
    }

    fn read_chunked(&self, header: FileHeader, from: u64, length: u64) -> Result<ByteStream> {
        let chunk_size = header
            .chunk_size
            .filter(|chunk_size| *chunk_size > 0)
            .ok_or(FileReconstructionError::MissingChunkSize)?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let engine = self.clone();
        tokio::spawn(async move {
            let mut index = (from / chunk_size) as usize;
            let mut pointer = from % chunk_size;
            let mut fetched = 0u64;

            while fetched < length && index < header.chunks.len() {
                let chunk = match engine.fetch_chunk(&header.chunks[index]).await {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        // Abort the whole read; the receiver observes the
                        // failure in sequence position.
                        let _ = tx.send(Err(err)).await;
                        return;
                    },
                };

                let available = (chunk.len() as u64).saturating_sub(pointer);
                let take = available.min(length - fetched);
                if take > 0 {
                    let piece = chunk.slice(pointer as usize..(pointer + take) as usize);
                    if tx.send(Ok(piece)).await.is_err() {
                        // Receiver dropped (client disconnect); stop fetching.
                        return;
                    }
                }

                fetched += take;
                index += 1;
                pointer = 0;
            }
        });
        Ok(ReceiverStream::new(rx))
    }

    /// Resolves one chunk reference and decodes its payload as raw bytes.
    async fn fetch_chunk(&self, chunk_ref: &str) -> Result<Bytes> {
        let (record_id, output_index) = split_chunk_ref(chunk_ref)?;
        debug!(record_id = %record_id, output_index = ?output_index, "fetching chunk record");
        let record = self.source.fetch_record(record_id).await?;
        self.decode_payload(&record, output_index)
    }

    /// Decodes the payload carried by one of the record's outputs: the
    /// explicitly indexed one, or the first data output.
    fn decode_payload(&self, record: &LedgerRecord, output_index: Option<u32>) -> Result<Bytes> {
        let output = match output_index {
            Some(index) => record.output(index),
            None => record.first_data_output(),
        }
        .ok_or_else(|| FileReconstructionError::NoDataOutput {
            record_id: record.id.clone(),
        })?;

        let script_hex = output.script.as_ref().map(|script| script.hex.as_str()).unwrap_or_default();
        let payload_hex =
            extract_payload(script_hex).map_err(|_| FileReconstructionError::NotStandardPayload {
                record_id: record.id.clone(),
                label: self.profile.label,
            })?;
        let payload_hex = payload_hex.strip_prefix(self.profile.tag_hex.as_str()).unwrap_or(payload_hex);
        Ok(Bytes::from(hex::decode(payload_hex)?))
    }

    /// Decodes the record's payload as a structured file header.
    fn decode_header(&self, record: &LedgerRecord) -> Result<FileHeader> {
        let payload = self.decode_payload(record, None)?;
        serde_json::from_slice(&payload).map_err(|source| FileReconstructionError::Decode {
            label: self.profile.label,
            source,
        })
    }
}

/// Splits a chunk reference into its record identifier and optional explicit
/// output index (`recordId:outputIndex`).
fn split_chunk_ref(chunk_ref: &str) -> Result<(&str, Option<u32>)> {
    match chunk_ref.split_once(':') {
        None => Ok((chunk_ref, None)),
        Some((record_id, index)) => {
            let index = index
                .parse()
                .map_err(|_| FileReconstructionError::MalformedChunkRef(chunk_ref.to_string()))?;
            Ok((record_id, Some(index)))
        },
    }
}

/// The window `[from, from + length)` of an inline buffer, clamped to the
/// bytes actually present.
fn slice_window(buffer: Vec<u8>, from: u64, length: u64) -> Bytes {
    if length == 0 {
        return Bytes::new();
    }
    let len = buffer.len() as u64;
    let start = from.min(len);
    let end = (from + length).min(len).max(start);
    Bytes::from(buffer).slice(start as usize..end as usize)
}
