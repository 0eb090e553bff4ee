// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the mining library.

use std::fmt;

/// Result type alias for mining operations.
pub type Result<T> = std::result::Result<T, MiningError>;

/// Main error type for the mining library.
#[derive(Debug)]
pub enum MiningError {
    /// Error loading the ONNX model.
    ModelLoadError(String),
    /// Error during model inference.
    InferenceError(String),
    /// Error processing images.
    ImageError(String),
    /// Error reading or parsing an annotation file.
    AnnotationError(String),
    /// Wrapped `std::io::Error`
    Io(std::io::Error),
}

impl fmt::Display for MiningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::InferenceError(msg) => write!(f, "Inference error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::AnnotationError(msg) => write!(f, "Annotation error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for MiningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MiningError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for MiningError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}

impl From<serde_json::Error> for MiningError {
    fn from(err: serde_json::Error) -> Self {
        Self::AnnotationError(err.to_string())
    }
}
