/// Result alias that carries the custom [`BowingError`] type.
pub type Result<T> = std::result::Result<T, BowingError>;

/// Common error type for the core crate.
///
/// Per-frame analysis never fails: missing landmarks surface as `None` and
/// short histories as neutral scores. These variants cover construction-time
/// contract violations and the I/O edges of the crate.
#[derive(Debug, thiserror::Error)]
pub enum BowingError {
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// A configuration value violates its documented range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Frog/tip reference points cannot describe a bow.
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed configuration or pose-frame JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl BowingError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for BowingError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for BowingError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
