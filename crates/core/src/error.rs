//! Unified error types for the ETL pipeline.
//!
//! Every failure is fatal to the step that raised it; the orchestrator
//! halts at the first error it sees. The variants follow the taxonomy:
//! - Connection: source or warehouse unreachable
//! - Extraction: a source query failed after connecting
//! - Load: a partition row could not be inserted
//! - Configuration: bad command or configuration value

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the ETL pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    /// Load failure for one table.
    #[error("load error in {table}: {message}")]
    Load { table: String, message: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    pub fn load(table: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Load {
            table: table.into(),
            message: msg.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short category name used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Extraction(_) => "extraction",
            Self::Load { .. } => "load",
            Self::Configuration(_) => "configuration",
            Self::Io(_) => "io",
            Self::Internal(_) => "internal",
        }
    }
}
