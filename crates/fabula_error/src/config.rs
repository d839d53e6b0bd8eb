//! Configuration loading errors.

/// A configuration layer could not be read or deserialized.
///
/// Covers the bundled `fabula.toml`, the optional user and working
/// directory files, and `FABULA__` environment overrides. The message
/// names the layer or field that failed.
///
/// # Examples
///
/// ```
/// use fabula_error::ConfigError;
///
/// let err = ConfigError::new("Failed to parse configuration: unknown variant `eager` for `scene_policy`");
/// assert!(err.to_string().starts_with("Configuration Error: Failed to parse"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Failing layer or field and the parser's explanation
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Record a configuration failure at the caller's location.
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
