//! Output locations for rendered configurations.
//!
//! Every node renders to a fixed file under the cache root:
//!
//! ```text
//! <cache_root>/<module>/<top-level configuration>/<node>
//! ```
//!
//! The renderer appends the format extension (`.jpg`, and `-crop.jpg` for
//! diagnostics). The map is built once per module after enrichment and
//! before rendering, and compositing only ever looks paths up here.
//!
//! The cache is a write target, not a read-through cache: every run
//! overwrites what it renders. [`clear_cache`] removes the whole tree.

use crate::model::{Configuration, Module};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration name → output path (without extension) for one module.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheMap {
    paths: HashMap<String, PathBuf>,
}

impl CacheMap {
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.paths.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn insert(&mut self, name: &str, path: PathBuf) {
        if let Some(previous) = self.paths.insert(name.to_string(), path) {
            warn!(
                configuration = name,
                previous = %previous.display(),
                "Duplicate configuration name, later definition wins"
            );
        }
    }
}

/// Derive the output path of every node of `module`, creating each
/// top-level configuration's directory.
pub fn build_path_map(module: &Module, cache_root: &Path) -> io::Result<CacheMap> {
    let mut map = CacheMap::default();
    let module_dir = cache_root.join(&module.name);
    for top in &module.configurations {
        let dir = module_dir.join(&top.name);
        std::fs::create_dir_all(&dir)?;
        add_subtree(&mut map, top, &dir);
    }
    debug!(module = %module.name, entries = map.len(), "Built cache map");
    Ok(map)
}

fn add_subtree(map: &mut CacheMap, config: &Configuration, dir: &Path) {
    map.insert(&config.name, dir.join(&config.name));
    for child in &config.configurations {
        add_subtree(map, child, dir);
    }
}

/// Recursively delete the cache root. A missing root is not an error.
pub fn clear_cache(cache_root: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(cache_root) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
