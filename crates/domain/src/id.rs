//! ID generation utilities.

use uuid::Uuid;

/// Generates a new time-ordered request ID.
///
/// UUID v7 includes timestamp information and is sortable, which keeps
/// request IDs in log output roughly in dispatch order.
#[must_use]
pub fn generate_request_id() -> String {
    Uuid::now_v7().to_string()
}
