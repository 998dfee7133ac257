use crate::channel::registry::Channel;
use crate::foundation::core::DataType;

/// Convenience result type used across lumaframe.
pub type FrameResult<T> = Result<T, FrameError>;

/// Top-level error taxonomy used by frame, device, and backend APIs.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    /// An optional channel was requested with an element type the backend cannot store.
    #[error("unsupported {channel} channel type: {requested}")]
    UnsupportedChannelType {
        /// Channel the write addressed.
        channel: Channel,
        /// Element type carried by the rejected write.
        requested: DataType,
    },

    /// A recognized parameter was written with the wrong value type.
    #[error("type mismatch for parameter '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Parameter name as given by the caller.
        name: String,
        /// Type the parameter accepts.
        expected: DataType,
        /// Type that was supplied.
        actual: DataType,
    },

    /// Invalid user-provided values or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// An operation was attempted before the frame was ready for it.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Failure reported by the render backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FrameError {
    /// Build a [`FrameError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FrameError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`FrameError::Backend`] value.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Build a [`FrameError::TypeMismatch`] value.
    pub fn type_mismatch(name: impl Into<String>, expected: DataType, actual: DataType) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
