use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Structural or data-corruption problem in a bitmap: bad signature,
    /// unsupported bit depth, truncated data, out-of-range palette index.
    #[error("Invalid bitmap: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Image decoder error: {0}")]
    Decoder(#[from] image::ImageError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ConvertError {
    pub fn format(msg: impl Into<String>) -> Self {
        ConvertError::Format(msg.into())
    }

    /// Returns `true` for errors raised while parsing bitmap data.
    pub fn is_format(&self) -> bool {
        matches!(self, ConvertError::Format(_))
    }
}

// Result type alias for conversion operations
pub type ConvertResult<T> = Result<T, ConvertError>;
