use serde::{Deserialize, Deserializer};

use crate::error::AppError;

pub mod event;
pub mod help_request;
mod macros;
pub mod pagination;
pub mod team;
pub mod user;
pub mod volunteer_log;

// Re-export all models for easy importing
pub use event::*;
pub use help_request::*;
pub use pagination::*;
pub use team::*;
pub use user::*;
pub use volunteer_log::*;

/// Keeps "field sent as null" (`Some(None)`) apart from "field absent" (`None`).
///
/// Use together with `#[serde(default)]`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Returns the trimmed value of a required text field, or a validation error.
pub fn require_text(field: &str, value: Option<String>) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::bad_request(format!("{} is required", field))),
    }
}

/// Validates a text field that is optional in a partial update but may not be blanked.
pub fn optional_text(field: &str, value: Option<String>) -> Result<Option<String>, AppError> {
    match value {
        Some(v) => {
            let v = v.trim().to_string();
            if v.is_empty() {
                Err(AppError::bad_request(format!("{} cannot be empty", field)))
            } else {
                Ok(Some(v))
            }
        }
        None => Ok(None),
    }
}
