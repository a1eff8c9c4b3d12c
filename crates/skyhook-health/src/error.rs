//! Health registry error types.

/// Health registry errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    /// Configuration rejected by [`crate::HealthConfig::validate`].
    #[error("Invalid health configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

/// Result type for health registry operations.
pub type HealthResult<T> = Result<T, HealthError>;
