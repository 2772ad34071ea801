//! Unified error type for trackscan.
//!
//! Tool and probe errors are folded into failure rows by the prober; only
//! configuration problems abort a scan. Report I/O errors live in the root
//! crate's `ReportError`.

/// Unified error type covering the failure modes of trackscan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration is missing a value or holds an invalid one.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external tool (mkvmerge, ...) could not be run or returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Probe output could not be interpreted.
    #[error("Probe error: {0}")]
    Probe(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Probe`].
    pub fn probe(message: impl Into<String>) -> Self {
        Error::Probe(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
