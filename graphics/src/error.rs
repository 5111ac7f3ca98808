//! Graphics error types.

use std::fmt;

/// Errors that can occur in the graphics system.
///
/// Only GPU initialization and the raw call layer surface these. Feeder and
/// scene operations absorb them and degrade to immediate-mode drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to initialize the GPU binding layer.
    InitializationFailed(String),
    /// Failed to create a buffer or texture.
    ResourceCreationFailed(String),
    /// Out of GPU memory.
    OutOfMemory,
    /// No GPU context could be made current.
    ContextUnavailable,
    /// An invalid parameter was provided.
    InvalidParameter(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::OutOfMemory => write!(f, "out of GPU memory"),
            Self::ContextUnavailable => write!(f, "no GPU context available"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}
