// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `trakem2`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "trakem2",
    version,
    about = "Inspect, project and export TrakEM2 annotation trees.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the settings file (TOML). A missing file means defaults.
    #[arg(long, global = true, value_name = "PATH", default_value = "trakem2.toml")]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TRAKEM2_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the tree as 3D line segments, one per edge.
    Segments(TreeArg),

    /// Pick the node nearest to a world-space point.
    Nearest(NearestArgs),

    /// Print the nested `t2_node` XML export of the tree.
    ExportXml(TreeArg),

    /// Project the tree in a supervised background job. Ctrl-C cancels.
    Mesh(TreeArg),
}

#[derive(Debug, Clone, Args)]
pub struct TreeArg {
    /// Tree document (TOML).
    #[arg(long, value_name = "FILE")]
    pub tree: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct NearestArgs {
    #[arg(long, value_name = "FILE")]
    pub tree: PathBuf,

    #[arg(long, allow_hyphen_values = true)]
    pub x: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub y: f64,

    #[arg(long)]
    pub layer: u64,

    /// Display magnification; pick tolerance is `radius_px / magnification`.
    #[arg(long, default_value_t = 1.0)]
    pub magnification: f64,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
