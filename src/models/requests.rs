//! Request DTOs for the recipe cache API
//!
//! Defines the structure of incoming HTTP request bodies. The generate
//! endpoint takes a [`RecipeQuery`](crate::similarity::RecipeQuery) directly.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::NAMESPACE_SEPARATOR;

/// Request body for `POST /cache/invalidate`
///
/// # Fields
/// - `namespace`: cache namespace to clear, e.g. "recipes"
/// - `params`: when present, only the entry for these params is removed
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Namespace to invalidate
    pub namespace: String,
    /// Optional params selecting a single entry
    #[serde(default)]
    pub params: Option<Value>,
}

impl InvalidateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.namespace.trim().is_empty() {
            return Some("Namespace cannot be empty".to_string());
        }
        if self.namespace.contains(NAMESPACE_SEPARATOR) {
            return Some(format!(
                "Namespace cannot contain '{}'",
                NAMESPACE_SEPARATOR
            ));
        }
        if self.namespace.len() > 64 {
            return Some("Namespace exceeds maximum length of 64 characters".to_string());
        }
        None
    }
}
