//! Layered geometry values.
//!
//! Every field on [`Rectangle`], [`Offsets`] and [`ImageProperties`] is an
//! `Option`: `None` means "not declared here, inherit it", and `Some(0)` is a
//! real, explicit zero. Enrichment resolves each field exactly once through
//! a three-tier fallback:
//!
//! ```text
//! node's own value  →  matched display's value  →  built-in default
//! ```
//!
//! Displays and configurations expose the same three groups through the
//! [`Geometry`] trait so a single [`cascade`] function fills both.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Built-in opacity when neither the node nor its display declares one.
pub const DEFAULT_OPACITY: f32 = 1.0;

/// Placement and output size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
}

impl Rectangle {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left: Some(left),
            top: Some(top),
            width: Some(width),
            height: Some(height),
        }
    }

    fn cascade(&mut self, fallback: Option<&Rectangle>) {
        let fb = fallback.copied().unwrap_or_default();
        self.left = self.left.or(fb.left).or(Some(0));
        self.top = self.top.or(fb.top).or(Some(0));
        self.width = self.width.or(fb.width).or(Some(0));
        self.height = self.height.or(fb.height).or(Some(0));
    }

    fn is_complete(&self) -> bool {
        self.left.is_some() && self.top.is_some() && self.width.is_some() && self.height.is_some()
    }
}

/// Crop window inside the source image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offsets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_offset_start: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_offset_finish: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_offset_start: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_offset_finish: Option<i32>,
}

impl Offsets {
    /// Offsets in the `(x_start, y_start) → (x_finish, y_finish)` order.
    pub fn new(x_start: i32, y_start: i32, x_finish: i32, y_finish: i32) -> Self {
        Self {
            x_offset_start: Some(x_start),
            x_offset_finish: Some(x_finish),
            y_offset_start: Some(y_start),
            y_offset_finish: Some(y_finish),
        }
    }

    fn cascade(&mut self, fallback: Option<&Offsets>) {
        let fb = fallback.copied().unwrap_or_default();
        self.x_offset_start = self.x_offset_start.or(fb.x_offset_start).or(Some(0));
        self.x_offset_finish = self.x_offset_finish.or(fb.x_offset_finish).or(Some(0));
        self.y_offset_start = self.y_offset_start.or(fb.y_offset_start).or(Some(0));
        self.y_offset_finish = self.y_offset_finish.or(fb.y_offset_finish).or(Some(0));
    }

    fn is_complete(&self) -> bool {
        self.x_offset_start.is_some()
            && self.x_offset_finish.is_some()
            && self.y_offset_start.is_some()
            && self.y_offset_finish.is_some()
    }
}

/// Blending and behaviour flags.
///
/// `image` is the transient canvas produced while compositing; it is never
/// read from or written to definition files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_as_switch: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_throttle_type: Option<bool>,
    #[serde(skip)]
    pub image: Option<RgbaImage>,
}

impl ImageProperties {
    fn cascade(&mut self, fallback: Option<&ImageProperties>) {
        let center = fallback.and_then(|f| f.center);
        let opacity = fallback.and_then(|f| f.opacity);
        let enabled = fallback.and_then(|f| f.enabled);
        let use_as_switch = fallback.and_then(|f| f.use_as_switch);
        let needs_throttle_type = fallback.and_then(|f| f.needs_throttle_type);

        self.center = self.center.or(center).or(Some(false));
        self.opacity = self.opacity.or(opacity).or(Some(DEFAULT_OPACITY));
        self.enabled = self.enabled.or(enabled).or(Some(true));
        self.use_as_switch = self.use_as_switch.or(use_as_switch).or(Some(false));
        self.needs_throttle_type = self
            .needs_throttle_type
            .or(needs_throttle_type)
            .or(Some(false));
    }

    fn is_complete(&self) -> bool {
        self.center.is_some()
            && self.opacity.is_some()
            && self.enabled.is_some()
            && self.use_as_switch.is_some()
            && self.needs_throttle_type.is_some()
    }
}

/// Anything that carries the three layered groups.
///
/// Implemented identically by displays and configurations so both run
/// through the same default-filling logic.
pub trait Geometry {
    fn rectangle(&self) -> &Rectangle;
    fn rectangle_mut(&mut self) -> &mut Rectangle;
    fn offsets(&self) -> &Offsets;
    fn offsets_mut(&mut self) -> &mut Offsets;
    fn properties(&self) -> &ImageProperties;
    fn properties_mut(&mut self) -> &mut ImageProperties;

    /// True once no field in any group is left unset.
    fn is_fully_resolved(&self) -> bool {
        self.rectangle().is_complete()
            && self.offsets().is_complete()
            && self.properties().is_complete()
    }
}

/// Fill every unset field of `target`, first from `fallback` (the matched
/// display, if any) and then from the built-in defaults.
///
/// Fields already set on `target` are never overwritten.
pub fn cascade<T, F>(target: &mut T, fallback: Option<&F>)
where
    T: Geometry + ?Sized,
    F: Geometry + ?Sized,
{
    target
        .rectangle_mut()
        .cascade(fallback.map(|f| f.rectangle()));
    target.offsets_mut().cascade(fallback.map(|f| f.offsets()));
    target
        .properties_mut()
        .cascade(fallback.map(|f| f.properties()));
}

/// Fill every unset field of `target` with the built-in defaults only.
pub fn apply_defaults<T: Geometry + ?Sized>(target: &mut T) {
    target.rectangle_mut().cascade(None);
    target.offsets_mut().cascade(None);
    target.properties_mut().cascade(None);
}

/// Plain-value snapshot of a fully enriched node, used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub x_start: i32,
    pub x_finish: i32,
    pub y_start: i32,
    pub y_finish: i32,
    pub center: bool,
    pub opacity: f32,
    pub enabled: bool,
    pub use_as_switch: bool,
}

impl Resolved {
    /// Snapshot `source`, or `None` if any field is still unset.
    pub fn from_geometry<G: Geometry + ?Sized>(source: &G) -> Option<Self> {
        let r = source.rectangle();
        let o = source.offsets();
        let p = source.properties();
        Some(Self {
            left: r.left?,
            top: r.top?,
            width: r.width?,
            height: r.height?,
            x_start: o.x_offset_start?,
            x_finish: o.x_offset_finish?,
            y_start: o.y_offset_start?,
            y_finish: o.y_offset_finish?,
            center: p.center?,
            opacity: p.opacity?,
            enabled: p.enabled?,
            use_as_switch: p.use_as_switch?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Bare {
        rect: Rectangle,
        offsets: Offsets,
        props: ImageProperties,
    }

    impl Geometry for Bare {
        fn rectangle(&self) -> &Rectangle {
            &self.rect
        }
        fn rectangle_mut(&mut self) -> &mut Rectangle {
            &mut self.rect
        }
        fn offsets(&self) -> &Offsets {
            &self.offsets
        }
        fn offsets_mut(&mut self) -> &mut Offsets {
            &mut self.offsets
        }
        fn properties(&self) -> &ImageProperties {
            &self.props
        }
        fn properties_mut(&mut self) -> &mut ImageProperties {
            &mut self.props
        }
    }

    #[test]
    fn explicit_zero_is_not_overridden() {
        let mut node = Bare {
            rect: Rectangle {
                left: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        let display = Bare {
            rect: Rectangle::new(40, 50, 512, 512),
            ..Default::default()
        };

        cascade(&mut node, Some(&display));

        assert_eq!(node.rect.left, Some(0));
        assert_eq!(node.rect.top, Some(50));
        assert_eq!(node.rect.width, Some(512));
    }

    #[test]
    fn defaults_fill_everything_left_unset() {
        let mut node = Bare::default();
        apply_defaults(&mut node);

        assert!(node.is_fully_resolved());
        assert_eq!(node.props.opacity, Some(1.0));
        assert_eq!(node.props.enabled, Some(true));
        assert_eq!(node.props.use_as_switch, Some(false));
        assert_eq!(node.props.center, Some(false));
        assert_eq!(node.props.needs_throttle_type, Some(false));
        assert_eq!(node.rect, Rectangle::new(0, 0, 0, 0));
    }

    #[test]
    fn display_value_beats_builtin_default() {
        let mut node = Bare::default();
        let display = Bare {
            props: ImageProperties {
                opacity: Some(0.25),
                center: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };

        cascade(&mut node, Some(&display));

        assert_eq!(node.props.opacity, Some(0.25));
        assert_eq!(node.props.center, Some(true));
        assert_eq!(node.props.enabled, Some(true));
    }

    #[test]
    fn resolved_requires_every_field() {
        let mut node = Bare::default();
        assert!(Resolved::from_geometry(&node).is_none());

        node.offsets = Offsets::new(0, 0, 256, 256);
        apply_defaults(&mut node);
        let resolved = Resolved::from_geometry(&node).unwrap();
        assert_eq!(resolved.x_finish, 256);
        assert_eq!(resolved.y_finish, 256);
        assert_eq!(resolved.opacity, 1.0);
    }

    #[test]
    fn offsets_deserialize_from_camel_case() {
        let json = r#"{"xOffsetStart": 10, "yOffsetFinish": 20}"#;
        let offsets: Offsets = serde_json::from_str(json).unwrap();
        assert_eq!(offsets.x_offset_start, Some(10));
        assert_eq!(offsets.x_offset_finish, None);
        assert_eq!(offsets.y_offset_finish, Some(20));
    }
}
