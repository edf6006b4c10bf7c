//! Pixel operations on in-memory buffers.
//!
//! These functions combine the pure [`calculations`](super::calculations)
//! with the actual pixel work. None of them touch the filesystem; decoding
//! and encoding stay behind the [`ImageBackend`](super::ImageBackend).
//!
//! Canvases are straight-alpha [`RgbaImage`]s. An image about to be blended
//! is first turned into a [`PremulImage`] by [`apply_opacity`], then painted
//! with [`composite_over`].

use super::calculations::visible_region;
use super::params::{CropRect, Placement};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};

/// An RGBA buffer whose colour channels are premultiplied by alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct PremulImage(RgbaImage);

impl PremulImage {
    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn as_raw(&self) -> &RgbaImage {
        &self.0
    }
}

/// Cut `rect` out of `source` and resample it to `target` with Lanczos3.
pub fn crop_and_resize(source: &RgbaImage, rect: CropRect, target: (u32, u32)) -> RgbaImage {
    let cropped = imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image();
    if cropped.dimensions() == target {
        return cropped;
    }
    imageops::resize(&cropped, target.0, target.1, FilterType::Lanczos3)
}

/// Scale every pixel's alpha by `opacity` and premultiply the colour
/// channels by the new alpha.
pub fn apply_opacity(image: &RgbaImage, opacity: f32) -> PremulImage {
    let op = opacity.clamp(0.0, 1.0);
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let [r, g, b, a] = px.0;
        let adj = (f32::from(a) * op).round() as u8;
        px.0 = [
            mul_div255(u16::from(r), u16::from(adj)),
            mul_div255(u16::from(g), u16::from(adj)),
            mul_div255(u16::from(b), u16::from(adj)),
            adj,
        ];
    }
    PremulImage(out)
}

/// Paint `src` onto `canvas` at `at` with source-over compositing.
///
/// The canvas stays straight-alpha. Fully transparent source pixels leave
/// the canvas untouched and fully opaque ones replace it.
pub fn composite_over(canvas: &mut RgbaImage, src: &PremulImage, at: Placement) {
    let Some((cx, cy, sx, sy, w, h)) = visible_region(canvas.dimensions(), at, src.dimensions())
    else {
        return;
    };
    for dy in 0..h {
        for dx in 0..w {
            let s = src.0.get_pixel(sx + dx, sy + dy).0;
            if s[3] == 0 {
                continue;
            }
            let d = canvas.get_pixel_mut(cx + dx, cy + dy);
            d.0 = if s[3] == u8::MAX {
                s
            } else {
                unpremultiply(over(premultiply(d.0), s))
            };
        }
    }
}

/// A fully transparent canvas.
pub fn blank_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::new(width, height)
}

/// Drop the alpha channel by compositing onto opaque black.
pub fn flatten_onto_black(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = premultiply(image.get_pixel(x, y).0);
        Rgb([r, g, b])
    })
}

fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

fn premultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let a16 = u16::from(a);
    [
        mul_div255(u16::from(r), a16),
        mul_div255(u16::from(g), a16),
        mul_div255(u16::from(b), a16),
        a,
    ]
}

fn unpremultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let a32 = u32::from(a);
    let div = |c: u8| ((u32::from(c) * 255 + a32 / 2) / a32).min(255) as u8;
    [div(r), div(g), div(b), a]
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    // =========================================================================
    // crop_and_resize tests
    // =========================================================================

    #[test]
    fn crop_then_resize_to_target() {
        let mut src = solid(512, 512, [0, 0, 255, 255]);
        for y in 0..256 {
            for x in 0..256 {
                src.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let rect = CropRect {
            x: 0,
            y: 0,
            width: 256,
            height: 256,
        };
        let out = crop_and_resize(&src, rect, (512, 512));
        assert_eq!(out.dimensions(), (512, 512));
        // Only the red quadrant was cropped
        let [r, _, b, a] = out.get_pixel(256, 256).0;
        assert!(r > 250 && b < 5 && a > 250);
    }

    #[test]
    fn crop_at_target_size_skips_resample() {
        let src = solid(10, 10, [1, 2, 3, 4]);
        let rect = CropRect {
            x: 2,
            y: 2,
            width: 5,
            height: 5,
        };
        assert_eq!(crop_and_resize(&src, rect, (5, 5)), solid(5, 5, [1, 2, 3, 4]));
    }

    // =========================================================================
    // opacity tests
    // =========================================================================

    #[test]
    fn full_opacity_on_opaque_pixels_is_identity() {
        let img = solid(2, 2, [10, 20, 30, 255]);
        assert_eq!(apply_opacity(&img, 1.0).as_raw(), &img);
    }

    #[test]
    fn half_opacity_scales_alpha_and_premultiplies() {
        let img = solid(1, 1, [200, 100, 0, 255]);
        let out = apply_opacity(&img, 0.5);
        assert_eq!(out.as_raw().get_pixel(0, 0).0, [100, 50, 0, 128]);
    }

    #[test]
    fn zero_opacity_clears_everything() {
        let img = solid(1, 1, [200, 100, 50, 255]);
        assert_eq!(apply_opacity(&img, 0.0).as_raw().get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    // =========================================================================
    // composite_over tests
    // =========================================================================

    #[test]
    fn opaque_source_replaces_canvas() {
        let mut canvas = solid(4, 4, [0, 255, 0, 255]);
        let src = apply_opacity(&solid(2, 2, [255, 0, 0, 255]), 1.0);
        composite_over(&mut canvas, &src, Placement { x: 1, y: 1 });
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(canvas.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(2, 2).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(3, 3).0, [0, 255, 0, 255]);
    }

    #[test]
    fn zero_opacity_leaves_canvas_unchanged() {
        let original = solid(4, 4, [12, 34, 56, 78]);
        let mut canvas = original.clone();
        let src = apply_opacity(&solid(4, 4, [255, 255, 255, 255]), 0.0);
        composite_over(&mut canvas, &src, Placement::default());
        assert_eq!(canvas, original);
    }

    #[test]
    fn half_opacity_blends_over_opaque_canvas() {
        let mut canvas = solid(1, 1, [0, 0, 0, 255]);
        let src = apply_opacity(&solid(1, 1, [255, 255, 255, 255]), 0.5);
        composite_over(&mut canvas, &src, Placement::default());
        assert_eq!(canvas.get_pixel(0, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn translucent_source_onto_blank_canvas() {
        let mut canvas = blank_canvas(1, 1);
        let src = apply_opacity(&solid(1, 1, [255, 0, 0, 255]), 0.5);
        composite_over(&mut canvas, &src, Placement::default());
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 0, 0, 128]);
    }

    #[test]
    fn placement_off_canvas_is_clipped() {
        let mut canvas = blank_canvas(4, 4);
        let src = apply_opacity(&solid(4, 4, [9, 9, 9, 255]), 1.0);
        composite_over(&mut canvas, &src, Placement { x: -2, y: 3 });
        assert_eq!(canvas.get_pixel(1, 3).0, [9, 9, 9, 255]);
        assert_eq!(canvas.get_pixel(2, 3).0, [0, 0, 0, 0]);
        assert_eq!(canvas.get_pixel(1, 2).0, [0, 0, 0, 0]);
    }

    // =========================================================================
    // flatten tests
    // =========================================================================

    #[test]
    fn flatten_multiplies_out_alpha() {
        let img = solid(1, 1, [200, 100, 50, 0]);
        assert_eq!(flatten_onto_black(&img).get_pixel(0, 0).0, [0, 0, 0]);
        let img = solid(1, 1, [200, 100, 50, 255]);
        assert_eq!(flatten_onto_black(&img).get_pixel(0, 0).0, [200, 100, 50]);
    }
}
