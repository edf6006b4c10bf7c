//! Inheritance resolution for configuration trees.
//!
//! [`enrich_module`] walks every tree of a module root-to-leaf and leaves
//! each node fully resolved:
//!
//! 1. The node records its module and parent names. An empty file
//!    reference inherits the parent's (or, at the top, the module's).
//! 2. The file reference is resolved against the asset root.
//! 3. The first display whose name is a prefix of the node's name is the
//!    node's match. List order breaks ties; there is no longest-match rule.
//!    A match fills every unset field from the display, then the built-in
//!    defaults fill the rest. Without a match only the defaults apply and
//!    the node keeps its parent's display reference.
//! 4. The path is resolved again now that the variant flag may have come
//!    from the display. Resolution is idempotent so nothing is substituted
//!    twice.
//! 5. Children are enriched with this node as their parent.
//!
//! Afterwards [`Geometry::is_fully_resolved`](crate::geometry::Geometry::is_fully_resolved) holds for every node.

use crate::context::Context;
use crate::geometry::{apply_defaults, cascade};
use crate::model::{Configuration, Display, DisplayId, Module};
use crate::paths::resolve_path;
use tracing::{debug, info};

/// What enrichment found while matching a module's nodes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnrichReport {
    pub matched: usize,
    /// Nodes with no display of their own, in visiting order.
    pub unmatched: Vec<String>,
}

/// First display whose name prefixes `name`.
pub fn match_display(name: &str, displays: &[Display]) -> Option<DisplayId> {
    displays
        .iter()
        .position(|d| name.starts_with(d.name.as_str()))
        .map(DisplayId)
}

/// Enrich every configuration of `module` in place.
pub fn enrich_module(module: &mut Module, displays: &[Display], ctx: &Context) -> EnrichReport {
    // Module files never carry the variant token
    if let Some(path) = resolve_path(&module.file_name, &ctx.assets, false, ctx.variant) {
        module.file_name = path;
    }

    let mut report = EnrichReport::default();
    let parent = NodeParent {
        module: &module.name,
        name: None,
        file_name: &module.file_name,
        display: None,
    };
    for config in &mut module.configurations {
        enrich_node(config, &parent, displays, ctx, &mut report);
    }
    report
}

/// What a node inherits from the level above it.
struct NodeParent<'a> {
    module: &'a str,
    name: Option<&'a str>,
    file_name: &'a str,
    display: Option<DisplayId>,
}

fn enrich_node(
    config: &mut Configuration,
    parent: &NodeParent<'_>,
    displays: &[Display],
    ctx: &Context,
    report: &mut EnrichReport,
) {
    config.module = Some(parent.module.to_string());
    config.parent = parent.name.map(str::to_string);
    if config.file_name.is_empty() {
        config.file_name = parent.file_name.to_string();
    }
    resolve_file(config, ctx);

    match match_display(&config.name, displays) {
        Some(id) => {
            let matched = &displays[id.0];
            debug!(configuration = %config.name, display = %matched.name, "Matched display");
            cascade(config, Some(matched));
            config.display = Some(id);
            report.matched += 1;
        }
        None => {
            info!(configuration = %config.name, "Configuration {} NOT matched", config.name);
            apply_defaults(config);
            config.display = parent.display;
            report.unmatched.push(config.name.clone());
        }
    }
    resolve_file(config, ctx);

    let mut children = std::mem::take(&mut config.configurations);
    {
        let here = NodeParent {
            module: parent.module,
            name: Some(&config.name),
            file_name: &config.file_name,
            display: config.display,
        };
        for child in &mut children {
            enrich_node(child, &here, displays, ctx, report);
        }
    }
    config.configurations = children;
}

fn resolve_file(config: &mut Configuration, ctx: &Context) {
    let needs_variant = config.properties.needs_throttle_type.unwrap_or(false);
    if let Some(path) = resolve_path(&config.file_name, &ctx.assets, needs_variant, ctx.variant) {
        config.file_name = path;
    }
}
