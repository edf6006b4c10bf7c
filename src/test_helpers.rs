//! Shared fixture builders for the unit tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut top = sized("L_MFD", 512, 512);
//! top.configurations.push(config("L_MFD_PAGE"));
//! let module = module("F-16C", "F-16C/cockpit.png", vec![top]);
//! let source = solid(512, 512, [255, 0, 0, 255]);
//! ```

use crate::geometry::{Offsets, Rectangle};
use crate::model::{Configuration, Display, Module};
use image::{Rgba, RgbaImage};

// =========================================================================
// Definition records
// =========================================================================

/// A configuration with nothing declared but its name.
pub fn config(name: &str) -> Configuration {
    Configuration::new(name)
}

/// A configuration that crops `width`x`height` from the source origin and
/// renders it at the same size at (0, 0).
pub fn sized(name: &str, width: i32, height: i32) -> Configuration {
    let mut c = Configuration::new(name);
    c.rectangle = Rectangle::new(0, 0, width, height);
    c.offsets = Offsets::new(0, 0, width, height);
    c
}

/// A display with nothing declared but its name.
pub fn display(name: &str) -> Display {
    Display {
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn module(name: &str, file_name: &str, configurations: Vec<Configuration>) -> Module {
    Module {
        name: name.to_string(),
        file_name: file_name.to_string(),
        configurations,
        ..Default::default()
    }
}

// =========================================================================
// Images
// =========================================================================

/// A single-colour image.
pub fn solid(width: u32, height: u32, px: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(px))
}

/// Write a single-colour PNG to `path`, creating parent directories.
pub fn write_png(path: &std::path::Path, width: u32, height: u32, px: [u8; 4]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    solid(width, height, px).save(path).unwrap();
}
