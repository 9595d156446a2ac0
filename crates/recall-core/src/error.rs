//! Error types for recall operations.
//!
//! Scheduling, retention and queue maintenance never fail on bad card data:
//! malformed annotations read as new cards, stale indices are skipped and
//! out-of-range numbers are clamped. The errors below are reserved for
//! caller contract violations and configuration I/O.

use thiserror::Error;

/// Result type alias for recall operations.
pub type RecallResult<T> = Result<T, RecallError>;

/// Main error type for all recall operations.
#[derive(Error, Debug)]
pub enum RecallError {
    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// A deck path did not resolve to an existing deck.
    #[error("Deck not found: {path}")]
    DeckNotFound { path: String, code: ErrorCode },

    /// A review or skip was requested while no card is selected.
    #[error("No card is currently selected")]
    NoCurrentCard,

    /// A response index outside the configured response options.
    #[error("Invalid response index {index}: {available} response options configured")]
    InvalidResponse { index: usize, available: usize },

    /// A scheduling annotation could not be parsed in strict mode.
    #[error("Annotation error: {message}")]
    Annotation { message: String, code: ErrorCode },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValInvalidConfig,
    ValInvalidResponse,

    // Deck (DECK_xxx)
    DeckNotFound,

    // Session (SES_xxx)
    SesNoCurrentCard,

    // Annotation (ANN_xxx)
    AnnMalformed,

    // Configuration (CFG_xxx)
    CfgUnsupportedFormat,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValInvalidConfig => "VAL_002",
            ErrorCode::ValInvalidResponse => "VAL_003",
            ErrorCode::DeckNotFound => "DECK_001",
            ErrorCode::SesNoCurrentCard => "SES_001",
            ErrorCode::AnnMalformed => "ANN_001",
            ErrorCode::CfgUnsupportedFormat => "CFG_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl RecallError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: None,
        }
    }

    /// Create a validation error with suggestion.
    pub fn validation_with_suggestion(
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidConfig,
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a deck-not-found error from a deck path.
    pub fn deck_not_found<S: AsRef<str>>(path: &[S]) -> Self {
        let joined = path.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join("/");
        Self::DeckNotFound {
            path: joined,
            code: ErrorCode::DeckNotFound,
        }
    }

    /// Create an annotation error.
    pub fn annotation(message: impl Into<String>) -> Self {
        Self::Annotation {
            message: message.into(),
            code: ErrorCode::AnnMalformed,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::DeckNotFound { code, .. } => *code,
            Self::Annotation { code, .. } => *code,
            Self::NoCurrentCard => ErrorCode::SesNoCurrentCard,
            Self::InvalidResponse { .. } => ErrorCode::ValInvalidResponse,
            Self::Configuration(_) => ErrorCode::CfgUnsupportedFormat,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::DeckNotFound { .. } => {
                Some("Create the deck path with DeckTree::create_deck before inserting")
            }
            Self::NoCurrentCard => Some("Call next_card before reviewing or skipping"),
            Self::InvalidResponse { .. } => {
                Some("Use an index into the configured response options")
            }
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }
}
