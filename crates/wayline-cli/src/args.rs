//! Command-line argument definitions for the Wayline CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, the layout preset, and logging verbosity.

use clap::Parser;

use wayline::config::LayoutPreset;

/// Command-line arguments for the Wayline layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input JSON snapshot
    #[arg(help = "Path to the input snapshot (JSON with `nodes` and `edges`)")]
    pub input: String,

    /// Path to the laid-out snapshot (JSON)
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Also render an SVG preview to this path
    #[arg(long)]
    pub svg: Option<String>,

    /// Layout preset (pipeline, branch, compact), overriding the config file
    #[arg(short, long)]
    pub preset: Option<LayoutPreset>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
