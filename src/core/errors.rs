//! Error types for the glossa-rs library.
//!
//! Every fallible operation in the clustering pipeline returns [`Result`].
//! The variants mirror the failure classes of a run: bad input halts before
//! clustering, misaligned partitions halt the evaluator, unwritable artifacts
//! halt the run. Degenerate input (empty definitions, isolated terms) is never
//! an error; it is counted on the run context instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main result type for glossa operations.
pub type Result<T> = std::result::Result<T, GlossaError>;

/// Error type for all glossa operations.
#[derive(Error, Debug)]
pub enum GlossaError {
    /// Malformed dataset or schema violation
    #[error("Input error: {message}")]
    Input {
        /// Error description
        message: String,
        /// Term identifier the error refers to
        term_id: Option<String>,
        /// Offending field of the term entry
        field: Option<String>,
    },

    /// Two partitions were compared over different identifier sets
    #[error(
        "Alignment error: {message} (only in left: {only_left:?}, only in right: {only_right:?})"
    )]
    Alignment {
        /// Error description
        message: String,
        /// Identifiers present only in the left partition
        only_left: Vec<String>,
        /// Identifiers present only in the right partition
        only_right: Vec<String>,
    },

    /// An artifact could not be written to its destination
    #[error("Failed to write artifact {}: {source}", path.display())]
    ArtifactWrite {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// I/O related errors
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Graph construction errors
    #[error("Graph error: {message}")]
    Graph {
        /// Error description
        message: String,
        /// Graph node or edge that caused the error
        element: Option<String>,
    },

    /// Partitioning algorithm errors
    #[error("Clustering error: {message}")]
    Clustering {
        /// Error description
        message: String,
        /// Algorithm that failed
        algorithm: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl GlossaError {
    /// Create a new input error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            term_id: None,
            field: None,
        }
    }

    /// Create a new input error pointing at a term
    pub fn input_term(message: impl Into<String>, term_id: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            term_id: Some(term_id.into()),
            field: None,
        }
    }

    /// Create a new input error pointing at a field of a term
    pub fn input_field(
        message: impl Into<String>,
        term_id: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self::Input {
            message: message.into(),
            term_id: Some(term_id.into()),
            field: Some(field.into()),
        }
    }

    /// Create a new alignment error from the symmetric difference of two universes
    pub fn alignment(
        message: impl Into<String>,
        only_left: Vec<String>,
        only_right: Vec<String>,
    ) -> Self {
        Self::Alignment {
            message: message.into(),
            only_left,
            only_right,
        }
    }

    /// Create a new artifact write error
    pub fn artifact_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ArtifactWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new graph error
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph {
            message: message.into(),
            element: None,
        }
    }

    /// Create a new clustering error naming the algorithm
    pub fn clustering_in(message: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self::Clustering {
            message: message.into(),
            algorithm: Some(algorithm.into()),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            Self::Io { message, .. } => {
                *message = format!("{}: {}", context.into(), message);
            }
            _ => {}
        }
        self
    }

    /// Whether this error belongs to the input class (halts before clustering)
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

impl From<io::Error> for GlossaError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for GlossaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for GlossaError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<GlossaError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}
