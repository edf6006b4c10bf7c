//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image::ImageReader` with content sniffing |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` after flattening onto black |

use super::backend::{BackendError, ImageBackend};
use super::operations::flatten_onto_black;
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Production backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn load(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        let image = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| {
                BackendError::Decode(format!("Failed to decode {}: {}", path.display(), e))
            })?;
        Ok(image.to_rgba8())
    }

    fn save(&self, image: &RgbaImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
        let rgb = flatten_onto_black(image);
        let file = File::create(path).map_err(BackendError::Io)?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality.value() as u8);
        encoder
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| {
                BackendError::Encode(format!("Failed to encode {}: {}", path.display(), e))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_png;
    use image::{Rgba, RgbaImage};

    #[test]
    fn load_synthetic_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("source.png");
        write_png(&path, 200, 150, [10, 20, 30, 255]);

        let img = RustBackend::new().load(&path).unwrap();
        assert_eq!(img.dimensions(), (200, 150));
        assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn load_sniffs_content_not_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let png = tmp.path().join("source.png");
        write_png(&png, 8, 8, [1, 2, 3, 255]);
        let misnamed = tmp.path().join("source.dat");
        std::fs::copy(&png, &misnamed).unwrap();

        assert!(RustBackend::new().load(&misnamed).is_ok());
    }

    #[test]
    fn load_nonexistent_file_is_io_error() {
        let result = RustBackend::new().load(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn load_garbage_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let result = RustBackend::new().load(&path);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn save_writes_decodable_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.jpg");
        let img = RgbaImage::from_pixel(64, 32, Rgba([200, 0, 0, 255]));

        let backend = RustBackend::new();
        backend.save(&img, &path, Quality::new(90)).unwrap();

        let back = backend.load(&path).unwrap();
        assert_eq!(back.dimensions(), (64, 32));
        let [r, g, _, a] = back.get_pixel(32, 16).0;
        assert!(r > 180 && g < 30);
        assert_eq!(a, 255);
    }

    #[test]
    fn save_into_missing_directory_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("missing").join("out.jpg");
        let result = RustBackend::new().save(&RgbaImage::new(4, 4), &path, Quality::default());
        assert!(matches!(result, Err(BackendError::Io(_))));
    }
}
