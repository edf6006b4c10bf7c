//! Definition records: displays, modules and their configuration trees.
//!
//! These mirror the JSON definition files. Geometry groups are flattened into
//! each record, so a display or configuration reads as one flat object:
//!
//! ```json
//! {
//!   "name": "L_MFD_1",
//!   "fileName": "Modules/F-16/left.png",
//!   "xOffsetStart": 0, "xOffsetFinish": 256,
//!   "yOffsetStart": 0, "yOffsetFinish": 256,
//!   "left": 0, "top": 0,
//!   "subConfigDef": [ ... ]
//! }
//! ```
//!
//! Ownership is strictly top-down: a module owns its configurations and each
//! configuration owns its children. Links that point back up or sideways
//! (module, parent, matched display) are plain lookup keys, never references.

use crate::geometry::{Geometry, ImageProperties, Offsets, Rectangle};
use serde::{Deserialize, Serialize};

/// Index into the run's display list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayId(pub usize);

/// Reusable template of default geometry, matched by name prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Display {
    pub name: String,
    #[serde(flatten)]
    pub rectangle: Rectangle,
    #[serde(flatten)]
    pub offsets: Offsets,
    #[serde(flatten)]
    pub properties: ImageProperties,
}

/// A named sub-region of a module's image, possibly nested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub name: String,
    #[serde(default)]
    pub file_name: String,
    /// Name of the owning module. Set during enrichment.
    #[serde(skip)]
    pub module: Option<String>,
    /// Name of the parent configuration; `None` for top-level nodes.
    #[serde(skip)]
    pub parent: Option<String>,
    /// Matched (or inherited) display. Set during enrichment.
    #[serde(skip)]
    pub display: Option<DisplayId>,
    #[serde(flatten)]
    pub rectangle: Rectangle,
    #[serde(flatten)]
    pub offsets: Offsets,
    #[serde(flatten)]
    pub properties: ImageProperties,
    #[serde(default, rename = "subConfigDef", skip_serializing_if = "Vec::is_empty")]
    pub configurations: Vec<Configuration>,
}

/// One instrument's asset group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub file_name: String,
    /// Definition file path relative to the discovery root, without `.json`.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub configurations: Vec<Configuration>,
}

/// Top-level shape of a module definition file.
#[derive(Debug, Deserialize)]
pub struct ModuleFile {
    #[serde(default)]
    pub modules: Vec<Module>,
}

macro_rules! impl_geometry {
    ($ty:ty) => {
        impl Geometry for $ty {
            fn rectangle(&self) -> &Rectangle {
                &self.rectangle
            }
            fn rectangle_mut(&mut self) -> &mut Rectangle {
                &mut self.rectangle
            }
            fn offsets(&self) -> &Offsets {
                &self.offsets
            }
            fn offsets_mut(&mut self) -> &mut Offsets {
                &mut self.offsets
            }
            fn properties(&self) -> &ImageProperties {
                &self.properties
            }
            fn properties_mut(&mut self) -> &mut ImageProperties {
                &mut self.properties
            }
        }
    };
}

impl_geometry!(Display);
impl_geometry!(Configuration);

impl Configuration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Visit this node and every descendant, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Configuration, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut dyn FnMut(&'a Configuration, usize)) {
        visit(self, depth);
        for child in &self.configurations {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Find the parent of the descendant called `name`.
    ///
    /// Returns the parent, the child's index within it and the child's
    /// depth below `self`. `None` if no descendant has that name.
    pub fn find_parent_mut(&mut self, name: &str) -> Option<(&mut Configuration, usize, usize)> {
        self.find_parent_at(name, 1)
    }

    fn find_parent_at(
        &mut self,
        name: &str,
        depth: usize,
    ) -> Option<(&mut Configuration, usize, usize)> {
        if let Some(idx) = self.configurations.iter().position(|c| c.name == name) {
            return Some((self, idx, depth));
        }
        self.configurations
            .iter_mut()
            .find_map(|c| c.find_parent_at(name, depth + 1))
    }

    /// Number of nodes in this subtree, including self.
    pub fn node_count(&self) -> usize {
        1 + self
            .configurations
            .iter()
            .map(Configuration::node_count)
            .sum::<usize>()
    }
}

impl Module {
    /// Total number of configuration nodes across every tree.
    pub fn node_count(&self) -> usize {
        self.configurations
            .iter()
            .map(Configuration::node_count)
            .sum()
    }

    /// Title used in reports: the display name, or the name if none is set.
    pub fn title(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}
