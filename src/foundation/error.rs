/// Convenience result type used across newsreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Failure taxonomy shared by every pipeline stage.
///
/// Variants name the stage domain that failed. Whether a failure aborts the run or only drops
/// one item is decided by the caller (see [`crate::Pipeline`]).
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid caller-provided values (settings, command specs, paths).
    #[error("validation error: {0}")]
    Validation(String),

    /// Manifest or runtime configuration problems.
    #[error("config error: {0}")]
    Config(String),

    /// Feed acquisition or collection failures.
    #[error("feed error: {0}")]
    Feed(String),

    /// Card layout, font, or image output failures.
    #[error("render error: {0}")]
    Render(String),

    /// External encoder failures (spawn, exit status, timeout, missing output).
    #[error("encode error: {0}")]
    Encode(String),

    /// Run metadata construction or persistence failures.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`ReelError::Feed`] value.
    pub fn feed(msg: impl Into<String>) -> Self {
        Self::Feed(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ReelError::Metadata`] value.
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
