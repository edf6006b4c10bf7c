//! Compositing pipeline.
//!
//! Walks an enriched configuration tree depth-first. Each node is rendered
//! onto its parent's finished canvas, and the result becomes the canvas its
//! own children are painted on:
//!
//! ```text
//! decode → crop → resize (Lanczos3) → place → opacity → source-over
//!        → ruler (optional) → save <cache path>.jpg
//! ```
//!
//! A top-level node has no parent canvas: it starts from a blank canvas of
//! its own size and is placed at the origin. Children are placed centred in
//! the parent canvas when `center` is set, otherwise at `(left, top)`.
//!
//! ## Failure handling
//!
//! Decode failures and degenerate crop windows abort the node and its whole
//! subtree, since the children have no canvas to draw on. Encode failures
//! only lose that node's file; the canvas still exists in memory, so its
//! children render normally. Siblings always continue. Every failure is
//! logged with the module, configuration and file involved.
//!
//! Canvases are dropped as soon as a node's subtree is finished, so at most
//! one branch of decoded images is held at a time.

use crate::cache::CacheMap;
use crate::context::Context;
use crate::geometry::Resolved;
use crate::imaging::{
    BackendError, ImageBackend, apply_opacity, blank_canvas, centered_placement, composite_over,
    crop_and_resize, crop_window, draw_ruler, offset_placement, target_size,
};
use crate::imaging::{CropIssue, Placement};
use crate::model::{Configuration, Module};
use image::RgbaImage;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Extension appended to every cache path.
pub const OUTPUT_EXTENSION: &str = ".jpg";
/// Suffix of the diagnostic pre-blend image.
pub const CROP_SUFFIX: &str = "-crop.jpg";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to decode {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error(
        "crop window ({x_start},{y_start})-({x_finish},{y_finish}) is empty on a {width}x{height} source"
    )]
    DegenerateCrop {
        x_start: i32,
        y_start: i32,
        x_finish: i32,
        y_finish: i32,
        width: u32,
        height: u32,
    },
    #[error("target size {width}x{height} is empty")]
    EmptyTarget { width: i32, height: i32 },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("no cache path for configuration {0}")]
    MissingCachePath(String),
    #[error("configuration {0} has not been enriched")]
    Unresolved(String),
    #[error("configuration {parent} has no child at index {index}")]
    NoSuchChild { parent: String, index: usize },
    #[error("cannot read canvas of {name} from {path}: {source}")]
    MissingParentCanvas {
        name: String,
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

/// Progress reported while rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    ModuleStarted {
        title: String,
        node_count: usize,
    },
    NodeRendered {
        depth: usize,
        name: String,
        output: PathBuf,
    },
    NodeFailed {
        depth: usize,
        name: String,
        error: String,
    },
}

/// Node counts for one or more modules.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub rendered: usize,
    pub failed: usize,
    /// Descendants of failed nodes that were never attempted.
    pub skipped: usize,
}

impl RenderSummary {
    pub fn add(&mut self, other: RenderSummary) {
        self.rendered += other.rendered;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

impl fmt::Display for RenderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rendered, {} failed", self.rendered, self.failed)?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

/// `path` with `suffix` appended to its final component.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

/// Renders the trees of one module into its cache map.
pub struct Renderer<'a, B: ImageBackend> {
    backend: &'a B,
    ctx: &'a Context,
    cache: &'a CacheMap,
}

impl<'a, B: ImageBackend> Renderer<'a, B> {
    pub fn new(backend: &'a B, ctx: &'a Context, cache: &'a CacheMap) -> Self {
        Self {
            backend,
            ctx,
            cache,
        }
    }

    /// Render one node and save it.
    ///
    /// With `child == None`, `node` is rendered standalone as a tree root.
    /// With `Some(i)`, child `i` of `node` is rendered onto `node`'s canvas,
    /// which is read back from its cache file if it is not in memory.
    ///
    /// The rendered canvas is kept on the node that was drawn. It is kept
    /// even when only the save failed.
    pub fn render(
        &self,
        node: &mut Configuration,
        child: Option<usize>,
    ) -> Result<PathBuf, RenderError> {
        let Some(index) = child else {
            return self.paint(node, None);
        };
        self.ensure_canvas(node)?;
        let Configuration {
            name,
            properties,
            configurations,
            ..
        } = node;
        let target = configurations
            .get_mut(index)
            .ok_or_else(|| RenderError::NoSuchChild {
                parent: name.clone(),
                index,
            })?;
        self.paint(target, properties.image.as_ref())
    }

    /// Render every tree of `module`.
    pub fn render_module(&self, module: &mut Module) -> RenderSummary {
        self.ctx.emit(RenderEvent::ModuleStarted {
            title: module.title().to_string(),
            node_count: module.node_count(),
        });
        let mut summary = RenderSummary::default();
        for top in &mut module.configurations {
            self.render_tree(top, &mut summary);
        }
        summary
    }

    /// Render only the configuration called `name` and its subtree.
    ///
    /// A nested node is drawn onto its parent's cached output from an
    /// earlier run. Returns `None` if no node has that name.
    pub fn render_sub(&self, module: &mut Module, name: &str) -> Option<RenderSummary> {
        let mut summary = RenderSummary::default();
        for top in &mut module.configurations {
            if top.name == name {
                self.render_tree(top, &mut summary);
                return Some(summary);
            }
            if let Some((parent, index, depth)) = top.find_parent_mut(name) {
                self.render_child(parent, index, depth, &mut summary);
                parent.properties.image = None;
                return Some(summary);
            }
        }
        None
    }

    /// Render `root` standalone, then everything below it.
    pub fn render_tree(&self, root: &mut Configuration, summary: &mut RenderSummary) {
        let result = self.render(root, None);
        if self.record(root, 0, result, summary) {
            for index in 0..root.configurations.len() {
                self.render_child(root, index, 1, summary);
            }
        }
        root.properties.image = None;
    }

    fn render_child(
        &self,
        parent: &mut Configuration,
        index: usize,
        depth: usize,
        summary: &mut RenderSummary,
    ) {
        let result = self.render(parent, Some(index));
        let child = &mut parent.configurations[index];
        if self.record(child, depth, result, summary) {
            for grandchild in 0..child.configurations.len() {
                self.render_child(child, grandchild, depth + 1, summary);
            }
        }
        child.properties.image = None;
    }

    /// Report a node's result. Returns whether its children can render.
    fn record(
        &self,
        node: &Configuration,
        depth: usize,
        result: Result<PathBuf, RenderError>,
        summary: &mut RenderSummary,
    ) -> bool {
        match result {
            Ok(output) => {
                summary.rendered += 1;
                self.ctx.emit(RenderEvent::NodeRendered {
                    depth,
                    name: node.name.clone(),
                    output,
                });
                true
            }
            Err(err) => {
                error!(
                    module = node.module.as_deref().unwrap_or_default(),
                    configuration = %node.name,
                    path = %node.file_name,
                    "{err}"
                );
                summary.failed += 1;
                self.ctx.emit(RenderEvent::NodeFailed {
                    depth,
                    name: node.name.clone(),
                    error: err.to_string(),
                });
                let has_canvas = node.properties.image.is_some();
                if !has_canvas {
                    summary.skipped += node.node_count() - 1;
                }
                has_canvas
            }
        }
    }

    /// Make sure `node` holds its canvas, reading its cache file if needed.
    fn ensure_canvas(&self, node: &mut Configuration) -> Result<(), RenderError> {
        if node.properties.image.is_some() {
            return Ok(());
        }
        let base = self
            .cache
            .get(&node.name)
            .ok_or_else(|| RenderError::MissingCachePath(node.name.clone()))?;
        let path = with_suffix(base, OUTPUT_EXTENSION);
        let image = self
            .backend
            .load(&path)
            .map_err(|source| RenderError::MissingParentCanvas {
                name: node.name.clone(),
                path: path.clone(),
                source,
            })?;
        debug!(configuration = %node.name, path = %path.display(), "Loaded cached canvas");
        node.properties.image = Some(image);
        Ok(())
    }

    /// Draw `target` onto a copy of `canvas` (or a blank canvas) and save it.
    fn paint(
        &self,
        target: &mut Configuration,
        canvas: Option<&RgbaImage>,
    ) -> Result<PathBuf, RenderError> {
        let r = Resolved::from_geometry(&*target)
            .ok_or_else(|| RenderError::Unresolved(target.name.clone()))?;
        let base = self
            .cache
            .get(&target.name)
            .ok_or_else(|| RenderError::MissingCachePath(target.name.clone()))?;

        let source_path = Path::new(&target.file_name);
        let source = self
            .backend
            .load(source_path)
            .map_err(|source| RenderError::ImageDecode {
                path: source_path.to_path_buf(),
                source,
            })?;

        let window = (r.x_start, r.y_start, r.x_finish, r.y_finish);
        let rect = crop_window(window, source.dimensions()).map_err(|_: CropIssue| {
            RenderError::DegenerateCrop {
                x_start: r.x_start,
                y_start: r.y_start,
                x_finish: r.x_finish,
                y_finish: r.y_finish,
                width: source.width(),
                height: source.height(),
            }
        })?;
        let size = target_size(r.width, r.height).ok_or(RenderError::EmptyTarget {
            width: r.width,
            height: r.height,
        })?;
        let resized = crop_and_resize(&source, rect, size);
        drop(source);

        let placement = match canvas {
            None => Placement::default(),
            Some(parent) if r.center => centered_placement(parent.dimensions(), size),
            Some(_) => offset_placement(r.left, r.top, (0, 0)),
        };
        let layer = apply_opacity(&resized, r.opacity);
        let mut composite = match canvas {
            Some(parent) => parent.clone(),
            None => blank_canvas(size.0, size.1),
        };
        composite_over(&mut composite, &layer, placement);
        if let Some(ruler) = self.ctx.ruler {
            draw_ruler(&mut composite, ruler);
        }

        let output = with_suffix(base, OUTPUT_EXTENSION);
        let saved = self.save(&composite, &output);
        // The diagnostic is written even when the main output failed
        let cropped = if self.ctx.save_cropped {
            self.save(&resized, &with_suffix(base, CROP_SUFFIX))
        } else {
            Ok(())
        };
        target.properties.image = Some(composite);
        saved.and(cropped)?;

        info!(
            configuration = %target.name,
            x = placement.x,
            y = placement.y,
            path = %output.display(),
            "Rendered"
        );
        Ok(output)
    }

    fn save(&self, image: &RgbaImage, path: &Path) -> Result<(), RenderError> {
        self.backend
            .save(image, path, self.ctx.quality)
            .map_err(|source| RenderError::Encode {
                path: path.to_path_buf(),
                source,
            })
    }
}
