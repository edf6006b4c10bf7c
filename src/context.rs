//! The run context handed to every core operation.
//!
//! Built once at startup from [`Settings`](crate::settings::Settings) and
//! passed by reference into path resolution, enrichment, cache mapping and
//! rendering. Nothing in the core reads process-wide state.

use crate::imaging::{Quality, RulerSpec};
use crate::paths::DeviceVariant;
use crate::render::RenderEvent;
use crate::settings::{ResolvedPaths, Settings};
use std::path::PathBuf;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone)]
pub struct Context {
    /// Root that image file references resolve against.
    pub assets: String,
    pub variant: DeviceVariant,
    /// Root of the render cache tree.
    pub cache_root: PathBuf,
    /// Ruler overlay, if enabled.
    pub ruler: Option<RulerSpec>,
    /// Persist the pre-blend image next to each output.
    pub save_cropped: bool,
    pub quality: Quality,
    events: Option<Sender<RenderEvent>>,
}

impl Context {
    /// A context with default output options.
    pub fn new(assets: impl Into<String>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            assets: assets.into(),
            variant: DeviceVariant::default(),
            cache_root: cache_root.into(),
            ruler: None,
            save_cropped: false,
            quality: Quality::default(),
            events: None,
        }
    }

    pub fn from_settings(settings: &Settings, paths: &ResolvedPaths) -> Self {
        let rulers = &settings.rulers;
        Self {
            assets: paths.assets.clone(),
            variant: DeviceVariant::from_cougar_flag(settings.device.use_cougar),
            cache_root: paths.cache.clone(),
            ruler: rulers.show.then(|| RulerSpec {
                interval: rulers.interval,
                tick_length: rulers.tick_length,
                labels: rulers.labels,
            }),
            save_cropped: settings.output.save_cropped_images,
            quality: Quality::new(settings.output.quality),
            events: None,
        }
    }

    /// Report render progress on `tx`.
    pub fn with_events(mut self, tx: Sender<RenderEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Send a progress event. A dropped receiver is not an error.
    pub fn emit(&self, event: RenderEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn from_settings_maps_every_option() {
        let mut settings = Settings::default();
        settings.device.use_cougar = true;
        settings.rulers.show = true;
        settings.rulers.interval = 25;
        settings.output.quality = 95;
        settings.output.save_cropped_images = true;
        let paths = settings.resolve_paths(Path::new("/base"));

        let ctx = Context::from_settings(&settings, &paths);
        assert_eq!(ctx.variant, DeviceVariant::Cougar);
        assert_eq!(ctx.ruler.map(|r| r.interval), Some(25));
        assert_eq!(ctx.quality.value(), 95);
        assert!(ctx.save_cropped);
        assert_eq!(ctx.cache_root, Path::new("/base").join("Cache"));
    }

    #[test]
    fn rulers_disabled_by_default() {
        let settings = Settings::default();
        let paths = settings.resolve_paths(Path::new("/base"));
        assert!(Context::from_settings(&settings, &paths).ruler.is_none());
    }

    #[test]
    fn emit_without_sink_is_silent() {
        let ctx = Context::new("/assets", "/cache");
        ctx.emit(RenderEvent::ModuleStarted {
            title: "F-16C".into(),
            node_count: 1,
        });
    }
}
