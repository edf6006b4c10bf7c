//! Definition file loading.
//!
//! Two inputs feed every run:
//!
//! - the **display file**: a JSON array of [`Display`] templates, and
//! - the **module tree**: every `*.json` file under the modules root, each
//!   an object with a `modules` array.
//!
//! ```text
//! Modules/
//! ├── Aircraft/
//! │   ├── F-16C.json        # category "Aircraft/F-16C"
//! │   └── FA-18C.json       # category "Aircraft/FA-18C"
//! └── Utility.json          # category "Utility"
//! ```
//!
//! Files are visited in file-name order so module order is stable between
//! runs. Any unreadable or malformed file fails the whole load.

use crate::geometry::apply_defaults;
use crate::model::{Display, Module, ModuleFile};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot load displays from {path}: {message}")]
    Displays { path: PathBuf, message: String },
    #[error("Cannot load modules from {path}: {message}")]
    Modules { path: PathBuf, message: String },
    #[error("Cannot walk module directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Read the display list. Every display gets the built-in defaults for
/// anything it leaves unset.
pub fn load_displays(path: &Path) -> Result<Vec<Display>, LoadError> {
    let fail = |message: String| LoadError::Displays {
        path: path.to_path_buf(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
    let mut displays: Vec<Display> =
        serde_json::from_str(&content).map_err(|e| fail(e.to_string()))?;
    for display in &mut displays {
        apply_defaults(display);
    }
    debug!(path = %path.display(), count = displays.len(), "Loaded displays");
    Ok(displays)
}

/// Discover and parse every module definition under `root`.
pub fn load_modules(root: &Path) -> Result<Vec<Module>, LoadError> {
    let mut modules = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_json(path) {
            continue;
        }
        let category = category_for(root, path);
        for mut module in parse_module_file(path)? {
            module.category = category.clone();
            modules.push(module);
        }
    }
    debug!(root = %root.display(), count = modules.len(), "Loaded modules");
    Ok(modules)
}

fn parse_module_file(path: &Path) -> Result<Vec<Module>, LoadError> {
    let fail = |message: String| LoadError::Modules {
        path: path.to_path_buf(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
    let file: ModuleFile = serde_json::from_str(&content).map_err(|e| fail(e.to_string()))?;
    Ok(file.modules)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// `path` relative to `root` with the extension removed, using `/`.
fn category_for(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
