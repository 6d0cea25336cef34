//! Error types shared across gridstack crates.

use std::path::PathBuf;

/// Top-level error type for gridstack operations.
///
/// Every variant is terminal for an invocation: nothing is retried and no
/// partial output is kept.
#[derive(Debug, thiserror::Error)]
pub enum GridstackError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Probe failed for {}: {message}", path.display())]
    Probe { path: PathBuf, message: String },

    #[error("No input: {message}")]
    EmptyInput { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using GridstackError.
pub type GridstackResult<T> = Result<T, GridstackError>;

impl GridstackError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: msg.into(),
        }
    }

    pub fn probe(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error stems from bad user input rather than a runtime failure.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Process exit code: 2 for usage errors, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        if self.is_usage_error() {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(GridstackError::invalid_config("rows must be >= 1").exit_code(), 2);
        assert_eq!(GridstackError::probe("a.png", "unreadable").exit_code(), 1);
        assert_eq!(GridstackError::empty_input("no files").exit_code(), 1);
        assert_eq!(GridstackError::render("ffmpeg exited 1").exit_code(), 1);
    }

    #[test]
    fn test_probe_message_names_path() {
        let err = GridstackError::probe("/tmp/missing.png", "file does not exist");
        assert_eq!(
            err.to_string(),
            "Probe failed for /tmp/missing.png: file does not exist"
        );
    }
}
