//! Error types for the OptiCore workspace.

use thiserror::Error;

/// A shared error type for the entire OptiCore workspace.
///
/// Variants map to the failure classes that actually occur when talking to
/// the hosted endpoints: fatal configuration problems, transport failures,
/// upstream HTTP errors and exhausted extraction attempts. "No URL found in
/// an otherwise fine response" inside the interpreter itself is *not* an
/// error; it is `Option::None`. These variants exist for the points where an
/// operation cannot continue without the missing value.
#[derive(Error, Debug, Clone)]
pub enum OptiCoreError {
    /// Missing or invalid configuration (endpoint URL, API key). Fatal, no retry.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level failure (connect, timeout, DNS). Drives the sync->async fallback.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream responded with a non-2xx status.
    #[error("HTTP {status} from {service}: {body}")]
    Http {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// A successful webhook response contained no recognizable result URL.
    #[error("No result URL found in webhook response: {0}")]
    NoResultUrl(String),

    /// The fallback submission yielded no job identifier.
    #[error("No job id found in webhook response: {0}")]
    NoJobId(String),

    /// Caller violated a precondition (e.g. an empty image buffer).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Row storage (Supabase) failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Classification failure that could not be represented in-band.
    #[error("Classification error: {0}")]
    Classification(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },
}

impl OptiCoreError {
    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an InvalidRequest error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates a Store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Creates a Classification error
    pub fn classification(message: impl Into<String>) -> Self {
        Self::Classification(message.into())
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a precondition violation
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    /// True for the failures that route the orchestrator from its synchronous
    /// attempt into the async fallback: transport errors, non-2xx responses
    /// and successful responses with no extractable URL.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Http { .. } | Self::NoResultUrl(_)
        )
    }
}

impl From<std::io::Error> for OptiCoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for OptiCoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for OptiCoreError {
    fn from(err: csv::Error) -> Self {
        Self::Serialization {
            format: "CSV".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for OptiCoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A type alias for `Result<T, OptiCoreError>`.
pub type Result<T> = std::result::Result<T, OptiCoreError>;
