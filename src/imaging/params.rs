//! Parameter types for image operations.
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`RulerSpec`] — Tick spacing and length for the measurement overlay.
//! - [`CropRect`] — A validated, non-empty crop window in source pixels.
//! - [`Placement`] — Where a resized image lands on its parent canvas.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Measurement ruler overlay settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulerSpec {
    /// Pixels between ticks.
    pub interval: u32,
    /// Tick length in pixels, centred on the axis.
    pub tick_length: u32,
    /// Print the pixel coordinate beside each tick.
    pub labels: bool,
}

impl Default for RulerSpec {
    fn default() -> Self {
        Self {
            interval: 50,
            tick_length: 10,
            labels: true,
        }
    }
}

/// A crop window with positive extent on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Top-left position of a child image on its parent canvas.
///
/// May be negative or past the canvas edge; compositing clips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_80() {
        assert_eq!(Quality::default().value(), 80);
    }
}
