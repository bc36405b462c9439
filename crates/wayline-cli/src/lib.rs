//! Wayline CLI library
//!
//! This module contains the core CLI logic for the Wayline layout tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use wayline::{DiagramBuilder, WaylineError};

/// Run the Wayline CLI application
///
/// This function reads a snapshot, lays it out with the batch layout engine
/// and writes the laid-out snapshot to the output file. When `args.svg` is
/// set, an SVG preview is written there as well.
///
/// # Errors
///
/// Returns `WaylineError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Snapshot parsing errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), WaylineError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing snapshot"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(preset) = args.preset {
        info!(preset:?; "Overriding layout preset");
        app_config = app_config.with_preset(preset);
    }

    let source = fs::read_to_string(&args.input)?;

    let builder = DiagramBuilder::new(app_config);
    let snapshot = builder.parse(&source)?;
    let layout = builder.layout(&snapshot);

    fs::write(&args.output, builder.to_json(&layout)?)?;
    info!(output_file = args.output; "Laid-out snapshot written");

    if let Some(svg_path) = &args.svg {
        builder.export_svg(&layout, svg_path)?;
        info!(output_file = svg_path.as_str(); "SVG preview written");
    }

    Ok(())
}
