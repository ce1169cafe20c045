//! Error kinds for attackgraph operations

use strum_macros::{Display, IntoStaticStr};

/// The kind of error that occurred.
///
/// This enum categorizes errors to help users write clear error handling logic.
/// Users can match on ErrorKind to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or operation is not supported
    Unsupported,

    /// Invalid configuration or parameters
    ConfigInvalid,

    // =========================================================================
    // Bundle errors
    // =========================================================================
    /// Failed to parse a STIX bundle
    BundleParseFailed,

    /// Bundle is structurally valid JSON but not a usable bundle
    InvalidFormat,

    // =========================================================================
    // Graph errors
    // =========================================================================
    /// Entity not found in the graph
    EntityNotFound,

    /// Graph construction failed
    GraphBuildFailed,

    // =========================================================================
    // Render errors
    // =========================================================================
    /// Building an output record failed
    RenderFailed,

    /// Serialization failed
    SerializationFailed,

    // =========================================================================
    // File/IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Directory traversal failed
    TraversalFailed,

    // =========================================================================
    // Resource errors
    // =========================================================================
    /// Timeout occurred
    Timeout,

    /// Resource exhausted
    ResourceExhausted,

    // =========================================================================
    // Validation errors
    // =========================================================================
    /// Invalid argument passed to function
    InvalidArgument,

    /// Assertion failed
    AssertionFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::ResourceExhausted | ErrorKind::IoFailed
        )
    }
}
