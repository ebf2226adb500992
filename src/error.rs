//! Error types for booking intake

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning a notification email into a reservation
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Message body could not be transport-decoded
    #[error("Failed to decode message body: {0}")]
    Decode(String),

    /// Decoded body could not be turned into a booking
    #[error("Failed to extract booking: {reason}")]
    Extraction { reason: ExtractionFailure },

    /// Reservation API answered with something other than 201 Created
    #[error("Reservation rejected with status {status}: {body}")]
    Submission { status: u16, body: String },

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file access failure (token cache, ledger)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// No cached token; interactive authorization has to be run first
    #[error("No cached mail token at {}; authorize the mailbox first", path.display())]
    AuthorizationRequired { path: PathBuf },

    /// Token endpoint refused to refresh the cached token
    #[error("Failed to refresh mail token: {0}")]
    TokenRefresh(String),
}

/// Why the extractor produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// Body was empty or whitespace only
    EmptyBody,
    /// None of the known layout markers were present
    UnrecognizedLayout,
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "empty body"),
            Self::UnrecognizedLayout => write!(f, "unrecognized layout"),
        }
    }
}

impl IntakeError {
    pub(crate) const fn extraction(reason: ExtractionFailure) -> Self {
        Self::Extraction { reason }
    }

    /// Coarse category used as a logging field
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Decode(_) | Self::Json(_) => ErrorCategory::Decode,
            Self::Extraction { .. } => ErrorCategory::Extraction,
            Self::Submission { .. } => ErrorCategory::Submission,
            Self::Http(_) | Self::Io(_) => ErrorCategory::Transport,
            Self::Config(_) | Self::AuthorizationRequired { .. } | Self::TokenRefresh(_) => {
                ErrorCategory::Setup
            }
        }
    }
}

/// Error categories for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Decode,
    Extraction,
    Submission,
    Transport,
    Setup,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode => write!(f, "decode"),
            Self::Extraction => write!(f, "extraction"),
            Self::Submission => write!(f, "submission"),
            Self::Transport => write!(f, "transport"),
            Self::Setup => write!(f, "setup"),
        }
    }
}

/// Result type for booking intake operations
pub type Result<T> = std::result::Result<T, IntakeError>;
