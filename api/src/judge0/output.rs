use base64::{engine::general_purpose::STANDARD, Engine};
use log::warn;

/// Reported in place of a stdout that decodes to whitespace only
pub const NO_OUTPUT: &str = "No output";
/// Reported in place of a payload that is not valid base64 text
pub const DECODE_ERROR: &str = "Error decoding output";

pub fn encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode a base64 payload of the execution service into text.
///
/// The service wraps long payloads over several lines, so whitespace is
/// dropped before decoding. Bytes that are not UTF-8 fail like bad base64.
pub fn decode(encoded: &str) -> Option<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = match STANDARD.decode(compact) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Unable to decode base64 payload: {}", e);
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Decoded payload is not valid UTF-8: {}", e);
            None
        }
    }
}

pub fn decode_stdout(encoded: &str) -> String {
    match decode(encoded) {
        Some(text) if text.trim().is_empty() => NO_OUTPUT.to_string(),
        Some(text) => text,
        None => DECODE_ERROR.to_string(),
    }
}

pub fn decode_stream(encoded: &str) -> String {
    decode(encoded).unwrap_or_else(|| DECODE_ERROR.to_string())
}
