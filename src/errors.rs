// Copyright 2025 Cowboy AI, LLC.

//! Error types for shape registration and classification

use std::fmt;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

/// Errors that can occur while registering shapes or classifying values
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// A raw shape description failed validation
    #[error("Malformed shape description {shape}: {reason}")]
    MalformedShape {
        /// Label of the offending description
        shape: String,
        /// What is wrong with it
        reason: String,
    },

    /// No candidate shape matched
    #[error(transparent)]
    MissingShape(#[from] MissingShape),

    /// More than one candidate shape matched
    #[error("Ambiguous shapes: both {first} and {second} match")]
    AmbiguousShapes {
        /// First matching shape
        first: String,
        /// Second matching shape
        second: String,
    },

    /// The input graph is not a tree
    #[error("Cycle detected at {path}")]
    CycleDetected {
        /// Location of the re-entered value
        path: String,
    },

    /// The input nests deeper than the configured limit
    #[error("Maximum nesting depth {limit} exceeded at {path}")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
        /// Location where the limit was hit
        path: String,
    },

    /// Configuration could not be loaded or is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error raised by a user-supplied hook or constructor
    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

/// Result type for classification operations
pub type ClassifyResult<T> = Result<T, ClassifyError>;

impl From<serde_json::Error> for ClassifyError {
    fn from(err: serde_json::Error) -> Self {
        ClassifyError::InvalidConfig(err.to_string())
    }
}

impl ClassifyError {
    pub(crate) fn malformed(shape: impl fmt::Display, reason: impl Into<String>) -> Self {
        ClassifyError::MalformedShape {
            shape: shape.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if no shape matched
    pub fn is_missing_shape(&self) -> bool {
        matches!(self, ClassifyError::MissingShape(_))
    }

    /// Check if several shapes matched
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ClassifyError::AmbiguousShapes { .. })
    }

    /// Check if the input contained a cycle
    pub fn is_cycle(&self) -> bool {
        matches!(self, ClassifyError::CycleDetected { .. })
    }

    /// Check if this was raised at registration time
    pub fn is_malformed_shape(&self) -> bool {
        matches!(self, ClassifyError::MalformedShape { .. })
    }
}

type Diagnose = dyn Fn() -> String + Send + Sync;

/// No shape matched a value
///
/// Creating one is cheap. The detailed explanation (decision path, input
/// keys, per-candidate rejection reasons) is computed on first use of
/// [`MissingShape::message`] or `Display`, and cached.
#[derive(Clone)]
pub struct MissingShape {
    inner: Arc<MissingShapeInner>,
}

struct MissingShapeInner {
    summary: String,
    diagnose: Option<Box<Diagnose>>,
    message: OnceLock<String>,
}

impl MissingShape {
    /// A miss with no deferred details
    pub fn new(summary: impl Into<String>) -> Self {
        Self::build(summary.into(), None)
    }

    /// A miss whose details are computed lazily by `diagnose`
    pub fn with_diagnostics<F>(summary: impl Into<String>, diagnose: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::build(summary.into(), Some(Box::new(diagnose)))
    }

    fn build(summary: String, diagnose: Option<Box<Diagnose>>) -> Self {
        Self {
            inner: Arc::new(MissingShapeInner {
                summary,
                diagnose,
                message: OnceLock::new(),
            }),
        }
    }

    /// One-line summary, available without computing diagnostics
    pub fn summary(&self) -> &str {
        &self.inner.summary
    }

    /// Full message including diagnostics
    pub fn message(&self) -> &str {
        self.inner.message.get_or_init(|| match &self.inner.diagnose {
            Some(diagnose) => {
                let details = diagnose();
                if details.is_empty() {
                    self.inner.summary.clone()
                } else {
                    format!("{}\n{}", self.inner.summary, details)
                }
            }
            None => self.inner.summary.clone(),
        })
    }

    /// True once the full message has been computed
    pub fn is_diagnosed(&self) -> bool {
        self.inner.message.get().is_some()
    }
}

impl fmt::Display for MissingShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl fmt::Debug for MissingShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MissingShape")
            .field("summary", &self.inner.summary)
            .field("diagnosed", &self.is_diagnosed())
            .finish()
    }
}

impl std::error::Error for MissingShape {}
