mod error;
mod header;
mod payload;
mod reader;

pub use error::{FileReconstructionError, Result};
pub use header::{FileHeader, FileKind, FileStats};
pub use payload::{NotStandardPayload, extract_payload};
pub use reader::{ByteStream, EncodingProfile, FileReader};
