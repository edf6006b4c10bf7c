//! # MFD Compose
//!
//! Composites cockpit display images (MFDs, gauges, panels) out of layered
//! configuration. Each module definition describes trees of configurations:
//! every node crops a window out of a source image, resizes it, and blends
//! it over the image its parent produced. The results land in a render
//! cache laid out by module and top-level configuration.
//!
//! # Architecture: Four Steps Per Module
//!
//! ```text
//! 1. Load      displays.json + Modules/**/*.json  →  Vec<Display>, Vec<Module>
//! 2. Enrich    fill every unset value: node → matched display → defaults
//! 3. Map       configuration name → <cache>/<module>/<top>/<name>
//! 4. Render    crop → resize → opacity → composite over parent → encode
//! ```
//!
//! Loading is all-or-nothing: a broken definition file stops the run.
//! Rendering is not: a node that fails is reported and its subtree skipped,
//! while its siblings and every other module carry on.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Layered `Option` value groups, the shared [`geometry::Geometry`] trait, cascade and defaults |
//! | [`model`] | Display, configuration and module records as read from JSON |
//! | [`paths`] | Asset path resolution: variant substitution, cleaning, containment |
//! | [`enrich`] | Display matching and inheritance over configuration trees |
//! | [`cache`] | Output path map per module, cache clearing |
//! | [`render`] | Depth-first compositing, render events and summary |
//! | [`imaging`] | Pure-Rust pixel work behind the [`imaging::ImageBackend`] trait |
//! | [`loader`] | Display file and recursive module discovery |
//! | [`settings`] | Layered `settings.toml` loading and validation |
//! | [`context`] | Run options passed to every core operation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Absence
//!
//! A definition that says `"left": 0` means zero; one that leaves `left` out
//! means "inherit". Every layered field is an `Option`, so the two never get
//! confused and an explicit zero survives enrichment.
//!
//! ## One Canvas Per Parent
//!
//! A node's composited image is kept on the node only while its children
//! render, then dropped. Memory stays bounded by tree depth rather than tree
//! size, and each child gets a fresh copy of the parent canvas so siblings
//! never see each other's pixels.
//!
//! ## No Global State
//!
//! Asset root, device variant, cache root and output options travel in a
//! [`context::Context`] built once from settings. Tests build their own.

pub mod cache;
pub mod context;
pub mod enrich;
pub mod geometry;
pub mod imaging;
pub mod loader;
pub mod model;
pub mod output;
pub mod paths;
pub mod render;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_helpers;
