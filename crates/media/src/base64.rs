//! Base64 helpers for attachment payloads.
//!
//! Structural validation and size estimation only look at the encoded text,
//! so an oversized payload is rejected without ever being decoded.

use ::base64::{
    Engine as _, alphabet,
    engine::general_purpose::{GeneralPurpose, PAD},
};

use crate::Result;

/// Standard alphabet, tolerant of non-zero bits in the final symbol.
const LENIENT: GeneralPurpose =
    GeneralPurpose::new(&alphabet::STANDARD, PAD.with_decode_allow_trailing_bits(true));

/// Tag that starts a data URL.
const DATA_URL_TAG: &str = "data:";
/// Marker between the MIME type and the base64 payload of a data URL.
const BASE64_MARKER: &str = ";base64,";

fn is_base64_alphabet(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

/// Return the payload of a `data:<mime>;base64,<payload>` URL, or the input
/// unchanged when it is not one.
///
/// The MIME part must be non-empty and may not contain `;`.
pub fn strip_data_url(input: &str) -> &str {
    let Some(rest) = input.strip_prefix(DATA_URL_TAG) else {
        return input;
    };
    match rest.find(';') {
        Some(semi) if semi > 0 => rest[semi..].strip_prefix(BASE64_MARKER).unwrap_or(input),
        _ => input,
    }
}

/// Remove every whitespace character (spaces, tabs, line breaks).
pub fn strip_whitespace(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Cheap structural check: non-empty, a multiple of four characters, standard
/// alphabet with at most two trailing `=`. Whitespace is ignored.
///
/// This does not prove the payload decodes (e.g. non-zero trailing bits pass).
pub fn is_valid_base64(value: &str) -> bool {
    let cleaned = strip_whitespace(value);
    if cleaned.is_empty() || cleaned.len() % 4 != 0 {
        return false;
    }
    let body = cleaned.trim_end_matches('=');
    let padding = cleaned.len() - body.len();
    padding <= 2 && !body.is_empty() && body.bytes().all(is_base64_alphabet)
}

/// Estimate the decoded length of a base64 string without decoding it.
///
/// ASCII whitespace and control bytes are ignored; up to two trailing `=`
/// reduce the estimate. Returns 0 for empty input.
pub fn estimate_base64_decoded_bytes(base64: &str) -> usize {
    let bytes = base64.as_bytes();
    let effective_len = bytes.iter().filter(|b| **b > b' ').count();
    if effective_len == 0 {
        return 0;
    }

    let padding = bytes
        .iter()
        .rev()
        .filter(|b| **b > b' ')
        .take(2)
        .take_while(|b| **b == b'=')
        .count();

    (effective_len * 3 / 4).saturating_sub(padding)
}

/// Decode at most `max_chars` leading characters of a clean base64 string.
///
/// The prefix is rounded down to a whole number of quads so partial payloads
/// decode without padding errors.
pub fn decode_prefix(base64: &str, max_chars: usize) -> Result<Vec<u8>> {
    let take = base64.len().min(max_chars) / 4 * 4;
    let prefix = base64.get(..take).unwrap_or_default();
    Ok(LENIENT.decode(prefix)?)
}
