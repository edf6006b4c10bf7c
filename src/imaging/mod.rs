//! Image processing — pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` |
//! | **Crop → Resize** | `imageops::crop_imm` + Lanczos3 `imageops::resize` |
//! | **Opacity / Composite** | premultiplied source-over on `RgbaImage` |
//! | **Ruler** | embedded bitmap font, direct pixel writes |
//! | **Encode** | `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop and placement math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Pixel work on in-memory buffers
//! - **Ruler**: The measurement overlay

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod ruler;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{
    CropIssue, centered_placement, crop_window, offset_placement, target_size,
};
pub use operations::{
    PremulImage, apply_opacity, blank_canvas, composite_over, crop_and_resize, flatten_onto_black,
};
pub use params::{CropRect, Placement, Quality, RulerSpec};
pub use ruler::draw_ruler;
pub use rust_backend::RustBackend;
