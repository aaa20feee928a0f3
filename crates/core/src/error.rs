/// Result alias that carries the custom [`CaptureError`] type.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Common error type for the core crate.
///
/// Every variant is terminal to the run in which it occurs; nothing in the
/// pipeline retries on its own.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Free-form message for failures that do not fit the taxonomy below.
    #[error("{0}")]
    Message(String),
    /// A capture request was malformed or missing a field.
    #[error("validation error: {0}")]
    Validation(String),
    /// Wrapper around standard IO errors raised while persisting frames.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The upload never produced a response (connect failure, reset).
    #[error("transport error: {0}")]
    Transport(String),
    /// The capture server answered with a non-success status.
    #[error("HTTP error! status: {status}, message: {body}")]
    Protocol { status: u16, body: String },
    /// The raster could not be turned into image bytes.
    #[error("encode error: {0}")]
    Encode(String),
    /// A configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl CaptureError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status the capture server answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            _ => 500,
        }
    }
}

impl From<&str> for CaptureError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for CaptureError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<reqwest::Error> for CaptureError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(value: image::ImageError) -> Self {
        Self::Encode(value.to_string())
    }
}
