//! Session identifiers.

use uuid::Uuid;

/// Generates an identifier for an editing or exploration session.
///
/// UUID v7 includes timestamp information, so session ids sort by creation
/// time in logs.
#[must_use]
pub fn generate_session_id() -> String {
    Uuid::now_v7().to_string()
}
