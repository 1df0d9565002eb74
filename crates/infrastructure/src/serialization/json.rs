//! Resource file encoding.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Encodes a resource file: fields in declaration order, 2-space indent,
/// trailing newline.
///
/// # Errors
///
/// Returns an error if `value` cannot be represented as JSON.
pub fn to_json_stable_bytes<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    value.serialize(&mut Serializer::with_formatter(
        &mut buffer,
        PrettyFormatter::with_indent(b"  "),
    ))?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Decodes a resource file. Minified input is accepted.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON describing a `T`.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice(bytes)
}
