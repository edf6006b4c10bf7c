//! Measurement ruler overlay.
//!
//! Draws a red horizontal and vertical axis through the canvas centre, black
//! ticks every `interval` pixels outward from the centre, and optionally the
//! absolute pixel coordinate of each tick. Labels are rasterized with
//! fontdue from a monospace TrueType font compiled into the binary, so no
//! font lookup happens at runtime.

use super::params::RulerSpec;
use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};
use std::sync::OnceLock;
use tracing::warn;

pub const AXIS_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const TICK_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Label font size in pixels.
const LABEL_SIZE: f32 = 13.0;
const LABEL_GAP: i64 = 5;

static LABEL_FONT_DATA: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono.ttf");

/// The embedded label font, parsed on first use. `None` if it fails to
/// parse, in which case labels are left out.
fn label_font() -> Option<&'static Font> {
    static FONT: OnceLock<Option<Font>> = OnceLock::new();
    FONT.get_or_init(|| match Font::from_bytes(LABEL_FONT_DATA, FontSettings::default()) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("Ruler labels disabled, cannot parse embedded font: {e}");
            None
        }
    })
    .as_ref()
}

/// Overlay the ruler onto `canvas` in place.
pub fn draw_ruler(canvas: &mut RgbaImage, spec: RulerSpec) {
    let (w, h) = (i64::from(canvas.width()), i64::from(canvas.height()));
    if w == 0 || h == 0 {
        return;
    }
    let (cx, cy) = (w / 2, h / 2);

    for y in 0..h {
        put(canvas, cx, y, AXIS_COLOR);
    }
    for x in 0..w {
        put(canvas, x, cy, AXIS_COLOR);
    }

    if spec.interval == 0 {
        return;
    }
    let step = i64::from(spec.interval);
    let half = i64::from(spec.tick_length) / 2;
    let font = if spec.labels { label_font() } else { None };

    for x in tick_positions(cx, w, step) {
        for dy in -half..=half {
            put(canvas, x, cy + dy, TICK_COLOR);
        }
        if let Some(font) = font {
            draw_text(canvas, font, &x.to_string(), x, cy + half + LABEL_GAP, TICK_COLOR);
        }
    }

    for y in tick_positions(cy, h, step) {
        for dx in -half..=half {
            put(canvas, cx + dx, y, TICK_COLOR);
        }
        if let Some(font) = font {
            let label = y.to_string();
            // Below the centre labels sit right of the axis, above it on the left
            let x = if y >= cy {
                cx + half + LABEL_GAP
            } else {
                cx - half - LABEL_GAP - text_width(font, &label)
            };
            draw_text(canvas, font, &label, x, y - text_height(font) / 2, TICK_COLOR);
        }
    }
}

/// Tick coordinates from `center` outward in both directions, within `0..len`.
fn tick_positions(center: i64, len: i64, step: i64) -> Vec<i64> {
    let forward = (center..len).step_by(step as usize);
    let backward = std::iter::successors(Some(center - step), |p| Some(p - step))
        .take_while(|p| *p >= 0);
    forward.chain(backward).collect()
}

/// Pixels above the baseline.
fn ascent(font: &Font) -> i64 {
    font.horizontal_line_metrics(LABEL_SIZE)
        .map_or(LABEL_SIZE, |m| m.ascent)
        .ceil() as i64
}

/// Line height of a label in pixels.
fn text_height(font: &Font) -> i64 {
    font.horizontal_line_metrics(LABEL_SIZE)
        .map_or(LABEL_SIZE, |m| m.ascent - m.descent)
        .ceil() as i64
}

/// Rendered width of `text` in pixels.
fn text_width(font: &Font, text: &str) -> i64 {
    let advance: f32 = text
        .chars()
        .map(|ch| font.metrics(ch, LABEL_SIZE).advance_width)
        .sum();
    advance.ceil() as i64
}

/// Draw `text` with the top-left corner of its line box at `(x, y)`.
fn draw_text(canvas: &mut RgbaImage, font: &Font, text: &str, x: i64, y: i64, color: Rgba<u8>) {
    let baseline = y + ascent(font);
    let mut pen = x as f32;
    for ch in text.chars() {
        let (metrics, bitmap) = font.rasterize(ch, LABEL_SIZE);
        let gx = pen.round() as i64 + i64::from(metrics.xmin);
        let gy = baseline - (metrics.height as i64 + i64::from(metrics.ymin));
        for row in 0..metrics.height {
            for col in 0..metrics.width {
                let coverage = bitmap[row * metrics.width + col];
                blend(canvas, gx + col as i64, gy + row as i64, color, coverage);
            }
        }
        pen += metrics.advance_width;
    }
}

/// Mix `color` into the pixel at `(x, y)` by glyph coverage.
fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: u8) {
    if coverage == 0 {
        return;
    }
    if coverage == u8::MAX {
        put(canvas, x, y, color);
        return;
    }
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    let c = u32::from(coverage);
    let inv = 255 - c;
    let d = canvas.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        d.0[i] = ((u32::from(color.0[i]) * c + u32::from(d.0[i]) * inv + 127) / 255) as u8;
    }
    d.0[3] = (c + (u32::from(d.0[3]) * inv + 127) / 255).min(255) as u8;
}

fn put(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(canvas.width()) && y < i64::from(canvas.height()) {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(interval: u32, labels: bool) -> RulerSpec {
        RulerSpec {
            interval,
            tick_length: 10,
            labels,
        }
    }

    fn font() -> &'static Font {
        label_font().unwrap()
    }

    /// Whether any pixel in the box is mostly covered.
    fn inked(canvas: &RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32) -> bool {
        (y0..y1).any(|y| (x0..x1).any(|x| canvas.get_pixel(x, y).0[3] > 128))
    }

    // =========================================================================
    // Axes and ticks
    // =========================================================================

    #[test]
    fn axes_cross_the_centre() {
        let mut canvas = RgbaImage::new(100, 60);
        draw_ruler(&mut canvas, spec(0, false));
        assert_eq!(*canvas.get_pixel(50, 0), AXIS_COLOR);
        assert_eq!(*canvas.get_pixel(50, 59), AXIS_COLOR);
        assert_eq!(*canvas.get_pixel(0, 30), AXIS_COLOR);
        assert_eq!(*canvas.get_pixel(99, 30), AXIS_COLOR);
        assert_eq!(canvas.get_pixel(10, 10).0, [0, 0, 0, 0]);
    }

    #[test]
    fn ticks_every_interval_from_centre() {
        let mut canvas = RgbaImage::new(200, 200);
        draw_ruler(&mut canvas, spec(50, false));
        // Horizontal axis ticks at x = 100, 150, 50, 0 span y = 95..=105
        for x in [0, 50, 150] {
            assert_eq!(*canvas.get_pixel(x, 95), TICK_COLOR, "x={x}");
            assert_eq!(*canvas.get_pixel(x, 105), TICK_COLOR, "x={x}");
        }
        assert_eq!(canvas.get_pixel(25, 95).0, [0, 0, 0, 0]);
        // Vertical axis ticks
        assert_eq!(*canvas.get_pixel(95, 150), TICK_COLOR);
        assert_eq!(*canvas.get_pixel(105, 50), TICK_COLOR);
    }

    #[test]
    fn tick_positions_cover_both_directions() {
        let mut ticks = tick_positions(100, 200, 50);
        ticks.sort();
        assert_eq!(ticks, vec![0, 50, 100, 150]);
    }

    // =========================================================================
    // Labels
    // =========================================================================

    #[test]
    fn embedded_font_parses() {
        assert!(label_font().is_some());
    }

    #[test]
    fn labels_draw_below_horizontal_axis() {
        let mut without = RgbaImage::new(200, 200);
        draw_ruler(&mut without, spec(50, false));
        let mut with = RgbaImage::new(200, 200);
        draw_ruler(&mut with, spec(50, true));
        assert_ne!(without, with);
        // Label "150" starts at (150, 110)
        assert!(inked(&with, 150, 110, 180, 130));
        assert!(!inked(&without, 150, 110, 180, 130));
    }

    #[test]
    fn labels_above_centre_sit_left_of_axis() {
        let mut canvas = RgbaImage::new(200, 200);
        draw_ruler(&mut canvas, spec(50, true));
        // "50" on the vertical axis, above the centre
        assert!(inked(&canvas, 60, 40, 95, 60));
        assert!(!inked(&canvas, 106, 40, 140, 60));
    }

    #[test]
    fn labels_are_readable_size() {
        let font = font();
        assert!(text_height(font) >= 13);
        assert!(text_width(font, "1") >= 6);
    }

    #[test]
    fn text_width_grows_with_length() {
        let font = font();
        assert_eq!(text_width(font, ""), 0);
        let one = text_width(font, "1");
        let three = text_width(font, "150");
        assert!(three > one * 2 && three <= one * 3);
    }

    #[test]
    fn drawing_off_canvas_is_ignored() {
        let mut canvas = RgbaImage::new(4, 4);
        draw_text(&mut canvas, font(), "-8", -40, -40, TICK_COLOR);
        assert_eq!(canvas, RgbaImage::new(4, 4));
    }

    #[test]
    fn partial_coverage_blends_toward_color() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        blend(&mut canvas, 0, 0, TICK_COLOR, 128);
        let [r, g, b, a] = canvas.get_pixel(0, 0).0;
        assert!((120..=135).contains(&r));
        assert_eq!((r, g, b), (r, r, r));
        assert_eq!(a, 255);
    }
}
