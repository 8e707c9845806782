//! Error types for the twins service

use thiserror::Error;

/// Twins service errors
#[derive(Debug, Error)]
pub enum TwinError {
    /// Credential missing, invalid or rejected by the identity verifier
    #[error("missing or invalid credentials provided")]
    Unauthorized,

    /// Requested twin or state does not exist
    #[error("non-existent entity")]
    NotFound,

    /// Entity already exists. Reserved for repositories enforcing uniqueness.
    #[error("entity already exists")]
    Conflict,

    /// Supplied entity or request has an invalid shape
    #[error("malformed entity specification: {0}")]
    MalformedEntity(String),

    /// Repository I/O failure
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Telemetry payload failed to parse
    #[error("malformed telemetry payload: {0}")]
    Decode(String),

    /// Outcome notification could not be published
    #[error("notification publish failed: {0}")]
    Notification(String),

    /// A state-save step failed for the given publisher
    #[error("{step} for {publisher} failed: {source}")]
    Telemetry {
        publisher: String,
        step: &'static str,
        #[source]
        source: Box<TwinError>,
    },
}

impl TwinError {
    /// Attach publisher and step context to an error on the state-save path.
    pub fn for_publisher(self, publisher: &str, step: &'static str) -> Self {
        Self::Telemetry {
            publisher: publisher.to_string(),
            step,
            source: Box::new(self),
        }
    }

    /// The underlying error, with any added context stripped.
    pub fn root(&self) -> &TwinError {
        match self {
            Self::Telemetry { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether redelivering the same request may succeed.
    ///
    /// Only repository failures qualify. Lookup, credential and payload
    /// errors fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self.root(), Self::Persistence(_))
    }

    /// Short, stable label of the underlying kind.
    pub fn kind(&self) -> &'static str {
        match self.root() {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::MalformedEntity(_) => "malformed_entity",
            Self::Persistence(_) => "persistence",
            Self::Decode(_) => "decode",
            Self::Notification(_) => "notification",
            Self::Telemetry { .. } => "telemetry",
        }
    }
}

/// Result type for twins operations
pub type TwinResult<T> = Result<T, TwinError>;
