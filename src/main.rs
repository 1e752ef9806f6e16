//! layout-tiler - Deep Zoom tile pyramids from chip layouts.
//!
//! This binary parses the command line, loads the design into the built-in
//! engine and runs the requested command.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use layout_tiler::{
    config::{
        resolve_levels, CheckArgs, Cli, Command, ExportArgs, PlanArgs, ProjectArgs, ProjectConfig,
    },
    error::ConfigError,
    export::{inventory, prepare_session, ExportOptions, PyramidExporter},
    io::OutputTree,
    pyramid::ExportPlan,
    render::{RenderSession, VectorEngine},
    slice::{MaskLayerIdentity, SliceSet},
    tile::PngTileEncoder,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Export(args) => run_export(args),
        Command::Plan(args) => run_plan(args),
        Command::Check(args) => run_check(args),
    }
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr so `plan` output on stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "layout_tiler=debug"
    } else {
        "layout_tiler=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Narrow a loaded project to its slices, logging any configuration error.
fn load_project(
    config: Result<ProjectConfig, ConfigError>,
    args: &ProjectArgs,
) -> Option<(ProjectConfig, SliceSet)> {
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return None;
        }
    };
    match args.slice_set(&config) {
        Ok(slices) => Some((config, slices)),
        Err(e) => {
            error!("Configuration error: {}", e);
            None
        }
    }
}

// =============================================================================
// Export Command
// =============================================================================

fn run_export(args: ExportArgs) -> ExitCode {
    init_logging(args.project.verbose);

    let Some((config, slices)) = load_project(args.project(), &args.project) else {
        return ExitCode::FAILURE;
    };
    let levels = match args.levels(&config) {
        Ok(levels) => levels,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  Style sheet: {}", config.style_sheet.display());
    for layout in &config.layouts {
        info!("  Layout: {}", layout.display());
    }
    info!("  Output: {}", config.output_dir.display());
    info!(
        "  Tiles: {}px, zoom depth {}, levels {}..={}",
        config.shape().tile_size(),
        config.zoom_depth,
        levels.start(),
        levels.end()
    );
    info!(
        "  Mode: {}",
        if config.transparent {
            "transparent"
        } else {
            "opaque"
        }
    );

    let mut engine = VectorEngine::with_oversampling(config.oversampling);
    let full_box = match prepare_session(&mut engine, &config.style_sheet, &config.layouts) {
        Ok(full_box) => full_box,
        Err(e) => {
            error!("Failed to load design: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut options = ExportOptions::from_config(&config, levels);
    if args.fast_png {
        options.encoder = PngTileEncoder::fast();
    }

    let output = OutputTree::new(&config.output_dir);
    let mut exporter = PyramidExporter::new(&mut engine, slices, output, options);
    match exporter.run(full_box, config.shape()) {
        Ok(stats) => {
            info!(
                "Wrote {} manifest(s) and {} tile(s) in {} renders",
                stats.manifests, stats.tiles, stats.renders
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Export failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Plan Command
// =============================================================================

fn run_plan(args: PlanArgs) -> ExitCode {
    init_logging(args.project.verbose);

    let Some((config, slices)) = load_project(args.project.project(), &args.project) else {
        return ExitCode::FAILURE;
    };
    let levels = match resolve_levels(args.levels.clone(), config.zoom_depth) {
        Ok(levels) => levels,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut engine = VectorEngine::new();
    let full_box = match prepare_session(&mut engine, &config.style_sheet, &config.layouts) {
        Ok(full_box) => full_box,
        Err(e) => {
            error!("Failed to load design: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let plan = ExportPlan::build_levels(full_box, &slices, config.shape(), levels);
    match serde_json::to_string_pretty(&plan.summary()) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize plan: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Check Command
// =============================================================================

fn run_check(args: CheckArgs) -> ExitCode {
    init_logging(args.project.verbose);

    println!("layout-tiler Project Check");
    println!("══════════════════════════");
    println!();

    let Some((config, slices)) = load_project(args.project.project(), &args.project) else {
        println!("✗ Configuration invalid");
        return ExitCode::FAILURE;
    };
    println!("✓ Configuration: {} slice(s)", slices.slices().len());

    let mut engine = VectorEngine::new();
    let full_box = match prepare_session(&mut engine, &config.style_sheet, &config.layouts) {
        Ok(full_box) => full_box,
        Err(e) => {
            println!("✗ Design: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "✓ Design extent: ({}, {}) - ({}, {})",
        full_box.left, full_box.bottom, full_box.right, full_box.top
    );
    println!();

    println!("Layers:");
    println!("───────");
    let mut malformed = 0;
    for layer in engine.layers() {
        match MaskLayerIdentity::parse(&layer.name) {
            Some(identity) => {
                let member_of: Vec<&str> = slices
                    .slices()
                    .iter()
                    .filter(|s| slices.is_visible(&identity, s))
                    .map(|s| s.name.as_str())
                    .collect();
                let member_of = if member_of.is_empty() {
                    "(no slice)".to_string()
                } else {
                    member_of.join(", ")
                };
                println!("  {:<32} {}", layer.name, member_of);
            }
            None => {
                malformed += 1;
                warn!(layer = %layer.name, "Layer name is not 'name.datatype - purpose'");
                println!("  {:<32} (hidden: unrecognized name)", layer.name);
            }
        }
    }
    if malformed > 0 {
        println!();
        println!("! {} layer(s) will never be shown", malformed);
    }
    println!();

    let plan = ExportPlan::build(full_box, &slices, config.shape());
    let output = OutputTree::new(&config.output_dir);
    let found = inventory(&output, &plan);
    println!("Output in {}:", output.root().display());
    println!("─────────────");
    println!(
        "  Manifests: {}/{}",
        found.manifests_present, found.manifests_expected
    );
    for pass in found.passes.iter().filter(|p| !p.is_complete()) {
        println!(
            "  {} level {}: {}/{} tiles",
            pass.slice, pass.level, pass.present, pass.expected
        );
    }

    println!();
    println!("══════════════════════════");
    if found.is_complete() {
        println!("✓ Output complete");
    } else {
        println!("✓ Checks passed, output incomplete");
    }

    ExitCode::SUCCESS
}
