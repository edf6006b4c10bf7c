use clap::{Parser, Subcommand};
use mfd_compose::cache::{build_path_map, clear_cache};
use mfd_compose::context::Context;
use mfd_compose::enrich::enrich_module;
use mfd_compose::imaging::RustBackend;
use mfd_compose::loader::{load_displays, load_modules};
use mfd_compose::model::{Display, Module};
use mfd_compose::output;
use mfd_compose::render::{RenderSummary, Renderer};
use mfd_compose::settings::{self, ResolvedPaths, Settings};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Environment variable that overrides `[logging] level`.
const LOG_ENV: &str = "MFD_LOG";

#[derive(Parser)]
#[command(name = "mfd-compose")]
#[command(about = "Composite cockpit display images from layered configuration")]
#[command(long_about = "\
Composite cockpit display images from layered configuration

Every module definition holds trees of configurations. Each configuration
crops a window from a source image, resizes it, and blends it over the image
its parent produced. Values a configuration leaves out come from the first
display whose name prefixes its own, then from built-in defaults.

Input layout (default base: ~/Saved Games/MFDMF):

  MFDMF/
  ├── settings.toml                # Optional, see 'mfd-compose gen-config'
  ├── displays.json                # Display templates
  ├── Modules/
  │   └── Aircraft/F-16C.json      # Category \"Aircraft/F-16C\"
  ├── Cache/                       # Output: <module>/<top>/<name>.jpg
  └── Logs/status.log

Run 'mfd-compose gen-config' to generate a documented settings.toml.")]
#[command(version)]
struct Cli {
    /// Settings file
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load, enrich and render modules into the cache
    Render {
        /// Only the module with this name
        #[arg(long)]
        module: Option<String>,
        /// Only this configuration and its subtree
        #[arg(long)]
        sub: Option<String>,
    },
    /// Load and enrich modules, then print the resolved trees
    Check {
        /// Only the module with this name
        #[arg(long)]
        module: Option<String>,
    },
    /// Delete the render cache
    ClearCache,
    /// Print a stock settings.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", settings::stock_settings_toml());
        return Ok(());
    }

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(settings::default_settings_path);
    let settings = settings::load_settings(&settings_path)?;
    let paths = settings.resolve_paths(&settings::default_base_dir());
    init_logging(&settings, &paths)?;
    info!(settings = %settings_path.display(), "Starting mfd-compose");

    match cli.command {
        Command::Render { module, sub } => {
            render(&settings, &paths, module.as_deref(), sub.as_deref())?;
        }
        Command::Check { module } => {
            check(&settings, &paths, module.as_deref())?;
        }
        Command::ClearCache => {
            clear_cache(&paths.cache)?;
            info!(cache = %paths.cache.display(), "Cache cleared");
            println!("==> Cleared {}", paths.cache.display());
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Log to stdout and to `<logs>/status.log`.
///
/// The level comes from `MFD_LOG`, then `[logging] level`, then `info`.
fn init_logging(
    settings: &Settings,
    paths: &ResolvedPaths,
) -> Result<(), Box<dyn std::error::Error>> {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<Level>().ok())
        .or_else(|| settings.logging.level.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let file = paths.open_log_file()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(std::io::stdout.and(Mutex::new(file)))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Load displays and modules, keeping only `filter` if given.
fn load_inputs(
    paths: &ResolvedPaths,
    filter: Option<&str>,
) -> Result<(Vec<Display>, Vec<Module>), Box<dyn std::error::Error>> {
    let displays = load_displays(&paths.displays)?;
    let mut modules = load_modules(&paths.modules)?;
    if let Some(name) = filter {
        modules.retain(|m| m.name == name);
        if modules.is_empty() {
            warn!(module = name, "No module with this name");
        }
    }
    info!(
        displays = displays.len(),
        modules = modules.len(),
        "Loaded definitions"
    );
    Ok((displays, modules))
}

/// Write the enriched tree of `module` to the log.
fn log_module(index: usize, module: &Module, displays: &[Display], begin: bool) {
    if begin {
        let exists = |p: &str| Path::new(p).exists();
        let tree = output::format_module(index, module, displays, &exists);
        info!(module = %module.name, "BEGIN {}\n{}", module.title(), tree.join("\n"));
    } else {
        info!(module = %module.name, "END {}", module.title());
    }
}

fn render(
    settings: &Settings,
    paths: &ResolvedPaths,
    filter: Option<&str>,
    sub: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (displays, modules) = load_inputs(paths, filter)?;

    let (tx, rx) = std::sync::mpsc::channel();
    let ctx = Context::from_settings(settings, paths).with_events(tx);
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_render_event(&event) {
                println!("{}", line);
            }
        }
    });

    let backend = RustBackend::new();
    let mut total = RenderSummary::default();
    let mut processed = 0;
    for (index, mut module) in modules.into_iter().enumerate() {
        enrich_module(&mut module, &displays, &ctx);
        log_module(index + 1, &module, &displays, true);

        let cache = match build_path_map(&module, &ctx.cache_root) {
            Ok(cache) => cache,
            Err(e) => {
                error!(module = %module.name, "Cannot prepare cache directories: {e}");
                continue;
            }
        };
        let renderer = Renderer::new(&backend, &ctx, &cache);
        let summary = match sub {
            Some(name) => match renderer.render_sub(&mut module, name) {
                Some(summary) => summary,
                None => continue,
            },
            None => renderer.render_module(&mut module),
        };

        log_module(index + 1, &module, &displays, false);
        total.add(summary);
        processed += 1;
    }

    if let (Some(name), 0) = (sub, processed) {
        warn!(configuration = name, "No configuration with this name");
    }

    // Closing the last sender ends the printer loop
    drop(ctx);
    printer.join().map_err(|_| "progress printer panicked")?;

    info!(modules = processed, "{total}");
    output::print_run_summary(processed, &total);
    Ok(())
}

fn check(
    settings: &Settings,
    paths: &ResolvedPaths,
    filter: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("==> Checking {}", paths.modules.display());
    let (displays, modules) = load_inputs(paths, filter)?;
    let ctx = Context::from_settings(settings, paths);

    let mut unmatched = 0;
    for (index, mut module) in modules.into_iter().enumerate() {
        let report = enrich_module(&mut module, &displays, &ctx);
        unmatched += report.unmatched.len();
        output::print_module(index + 1, &module, &displays, &report);
    }
    println!("==> Definitions are valid ({unmatched} unmatched configurations)");
    Ok(())
}
