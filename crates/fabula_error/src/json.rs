//! Story record serialization errors.

/// A story record or manifest could not be encoded or decoded as JSON.
///
/// Enable the `json` feature to convert `serde_json::Error` directly.
///
/// # Examples
///
/// ```
/// use fabula_error::JsonError;
///
/// let err = JsonError::new("missing field `story_id` at line 1 column 2");
/// assert!(err.to_string().contains("missing field `story_id`"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: {} at line {} in {}", message, line, file)]
pub struct JsonError {
    /// Message reported by the JSON codec
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Record a codec failure at the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for JsonError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}
