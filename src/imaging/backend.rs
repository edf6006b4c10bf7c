//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the only two operations that touch
//! files: decoding a source image and encoding a finished canvas. All pixel
//! work in between is done on in-memory buffers by
//! [`operations`](super::operations), which keeps the compositing pipeline
//! testable against the in-memory [`MockBackend`](tests::MockBackend).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::Quality;
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Trait for image codec backends.
pub trait ImageBackend {
    /// Decode an image file into straight-alpha RGBA.
    fn load(&self, path: &Path) -> Result<RgbaImage, BackendError>;

    /// Encode `image` to `path` (extension included by the caller).
    fn save(&self, image: &RgbaImage, path: &Path, quality: Quality) -> Result<(), BackendError>;
}
