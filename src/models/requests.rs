//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Maximum allowed tag length in bytes
pub const MAX_TAG_LENGTH: usize = 256;

/// Request body for tag invalidation (POST /invalidate)
///
/// # Fields
/// - `tags`: Entries carrying any of these tags are removed
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub tags: Vec<String>,
}

impl InvalidateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.tags.is_empty() {
            return Some("At least one tag is required".to_string());
        }
        if self.tags.iter().any(|tag| tag.is_empty()) {
            return Some("Tags cannot be empty".to_string());
        }
        if self.tags.iter().any(|tag| tag.len() > MAX_TAG_LENGTH) {
            return Some(format!(
                "Tag exceeds maximum length of {} characters",
                MAX_TAG_LENGTH
            ));
        }
        None
    }
}
