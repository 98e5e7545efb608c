use thiserror::Error;

/// The script's framing was not one of the recognized pushdata forms.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("script is not a recognized framed payload")]
pub struct NotStandardPayload;

/// Strips the return-marker/opcode framing from a data output's script and
/// returns the embedded payload hex.
///
/// The declared pushdata length is advisory only; the remainder of the script
/// is trusted instead, so trailing bytes beyond the declared length are kept.
pub fn extract_payload(script_hex: &str) -> Result<&str, NotStandardPayload> {
    let hex = script_hex.strip_prefix("006a").unwrap_or(script_hex);
    let rest = match hex.get(..2) {
        Some("4c") => hex.get(4..),  // one length byte
        Some("4d") => hex.get(6..),  // two length bytes
        Some("4e") => hex.get(10..), // four length bytes
        _ => None,
    };
    rest.ok_or(NotStandardPayload)
}
