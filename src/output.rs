//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity leads with its identity (module title, configuration name)
//! and shows files as indented context lines. The same layout is used by
//! `check`, by the render progress stream and by the module dump written to
//! the log before rendering.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! 001 F-16C Viper (3 configurations)
//!     Name: F-16C  Tag: viper  Category: Aircraft/F-16C
//!     Source: /assets/F-16C/cockpit.png
//!     L_MFD_1 ← L_MFD
//!         Rect: 0,0 512x512  Crop: (0,0)-(256,256)
//!         Opacity: 1.00  Center: false  Enabled: true  Switch: false
//!         Source: /assets/F-16C/cockpit.png
//!         L_MFD_1_OSB ← L_MFD
//!             ...
//!             Source: /assets/F-16C/osb.png (missing)
//!     Unmatched: R_PANEL
//! ```
//!
//! ## Render
//!
//! ```text
//! F-16C Viper (3 configurations)
//!     L_MFD_1 → Cache/F-16C/L_MFD_1/L_MFD_1.jpg
//!         L_MFD_1_OSB: failed to decode /assets/F-16C/osb.png: ...
//! Processed 1 module: 2 rendered, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: file existence is asked through a caller-supplied
//! predicate.

use crate::enrich::EnrichReport;
use crate::geometry::Resolved;
use crate::model::{Configuration, Display, Module};
use crate::render::{RenderEvent, RenderSummary};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format an enriched module as an indented tree of resolved values.
pub fn format_module(
    index: usize,
    module: &Module,
    displays: &[Display],
    exists: &dyn Fn(&str) -> bool,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} ({})",
        format_index(index),
        module.title(),
        plural(module.node_count(), "configuration")
    )];
    let mut ident = format!("{}Name: {}", indent(1), module.name);
    if !module.tag.is_empty() {
        ident.push_str(&format!("  Tag: {}", module.tag));
    }
    if !module.category.is_empty() {
        ident.push_str(&format!("  Category: {}", module.category));
    }
    lines.push(ident);
    lines.push(format!(
        "{}Source: {}",
        indent(1),
        source_line(&module.file_name, exists)
    ));

    for top in &module.configurations {
        top.walk(&mut |node, depth| {
            format_configuration(&mut lines, node, depth + 1, displays, exists);
        });
    }
    lines
}

fn format_configuration(
    lines: &mut Vec<String>,
    node: &Configuration,
    depth: usize,
    displays: &[Display],
    exists: &dyn Fn(&str) -> bool,
) {
    let display = node
        .display
        .and_then(|id| displays.get(id.0))
        .map_or("(no display)", |d| d.name.as_str());
    lines.push(format!("{}{} \u{2190} {}", indent(depth), node.name, display));

    let detail = indent(depth + 1);
    match Resolved::from_geometry(node) {
        Some(r) => {
            lines.push(format!(
                "{detail}Rect: {},{} {}x{}  Crop: ({},{})-({},{})",
                r.left, r.top, r.width, r.height, r.x_start, r.y_start, r.x_finish, r.y_finish
            ));
            lines.push(format!(
                "{detail}Opacity: {:.2}  Center: {}  Enabled: {}  Switch: {}",
                r.opacity, r.center, r.enabled, r.use_as_switch
            ));
        }
        None => lines.push(format!("{detail}(not enriched)")),
    }
    lines.push(format!("{detail}Source: {}", source_line(&node.file_name, exists)));
}

fn source_line(path: &str, exists: &dyn Fn(&str) -> bool) -> String {
    if path.is_empty() {
        "(none)".to_string()
    } else if exists(path) {
        path.to_string()
    } else {
        format!("{path} (missing)")
    }
}

/// Names of configurations that matched no display, if any.
pub fn format_enrich_report(report: &EnrichReport) -> Option<String> {
    if report.unmatched.is_empty() {
        return None;
    }
    Some(format!("{}Unmatched: {}", indent(1), report.unmatched.join(", ")))
}

/// Print a module's check report to stdout.
pub fn print_module(index: usize, module: &Module, displays: &[Display], report: &EnrichReport) {
    let exists = |p: &str| Path::new(p).exists();
    for line in format_module(index, module, displays, &exists) {
        println!("{}", line);
    }
    if let Some(line) = format_enrich_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Render output
// ============================================================================

/// Format a single render progress event as display lines.
pub fn format_render_event(event: &RenderEvent) -> Vec<String> {
    match event {
        RenderEvent::ModuleStarted { title, node_count } => {
            vec![format!("{} ({})", title, plural(*node_count, "configuration"))]
        }
        RenderEvent::NodeRendered {
            depth,
            name,
            output,
        } => vec![format!(
            "{}{} \u{2192} {}",
            indent(depth + 1),
            name,
            output.display()
        )],
        RenderEvent::NodeFailed { depth, name, error } => {
            vec![format!("{}{}: {}", indent(depth + 1), name, error)]
        }
    }
}

/// Closing line of a render run.
pub fn format_run_summary(modules: usize, summary: &RenderSummary) -> String {
    format!("Processed {}: {}", plural(modules, "module"), summary)
}

pub fn print_run_summary(modules: usize, summary: &RenderSummary) {
    println!("{}", format_run_summary(modules, summary));
}
