//! gridstack CLI: lay out images and videos on a grid and composite them.
//!
//! Usage:
//!   gridstack stack [DIR] [OPTIONS]   Render the grid to an image or video
//!   gridstack plan [DIR] [OPTIONS]    Print the layout as JSON
//!   gridstack check                   Check for ffmpeg and friends

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gridstack_common::config::AppConfig;
use gridstack_common::error::GridstackError;

mod args;
mod commands;
mod inputs;

use args::LayoutArgs;
use commands::stack::StackOptions;

#[derive(Parser, Debug)]
#[command(
    name = "gridstack",
    about = "Stack images and videos into a grid",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors and the output path
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render inputs from a directory into one grid image or video
    Stack {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Output file; the extension selects the format
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output frame rate for video
        #[arg(long)]
        fps: Option<f64>,

        /// Drop the first input's audio track
        #[arg(long)]
        no_audio: bool,

        /// Abort ffmpeg after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Print the ffmpeg command instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the planned layout as JSON
    Plan {
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(e.exit_code().clamp(0, 255) as u8);
        }
    };

    let (config, config_error) = load_config(cli.config.as_deref());

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    } else if cli.quiet {
        logging.level = "warn".to_string();
    }
    gridstack_common::logging::init_logging(&logging);
    if let Some(err) = config_error {
        tracing::warn!(error = %err, "Ignoring unusable config, using defaults");
    }

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Stack {
            layout,
            output,
            fps,
            no_audio,
            timeout_secs,
            dry_run,
        } => {
            let settings = layout.resolve(config)?;
            let options = StackOptions {
                output,
                fps,
                no_audio,
                timeout_secs,
                dry_run,
                quiet: cli.quiet,
            };
            commands::stack::run(settings, options, config).await
        }
        Commands::Plan { layout } => commands::plan::run(layout.resolve(config)?),
        Commands::Check => commands::check::run(),
    }
}

/// Config from `path` or the standard location, with defaults on failure.
///
/// The failure is handed back so it can be logged once logging is set up.
fn load_config(path: Option<&Path>) -> (AppConfig, Option<GridstackError>) {
    let loaded = match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    }
}

/// Usage errors exit with 2, everything else with 1.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<GridstackError>())
        .map(GridstackError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstack_grid_model::{Align, Background, FitMode};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("gridstack").chain(args.iter().copied()))
    }

    #[test]
    fn test_stack_flags() {
        let cli = parse(&[
            "stack",
            "clips",
            "-n",
            "2",
            "-m",
            "3",
            "--fit-mode",
            "cover",
            "--cell-width",
            "320",
            "--cell-height",
            "180",
            "--gutter",
            "4",
            "--align",
            "right",
            "--bg-color",
            "#202020",
            "--exts",
            "mp4,mov",
            "--limit",
            "5",
            "-o",
            "out.mp4",
            "--fps",
            "25",
            "--no-audio",
            "--dry-run",
            "-q",
        ])
        .unwrap();

        assert!(cli.quiet);
        let Commands::Stack {
            layout,
            output,
            fps,
            no_audio,
            dry_run,
            ..
        } = cli.command
        else {
            panic!("expected stack");
        };
        assert_eq!(layout.dir, Some(PathBuf::from("clips")));
        assert_eq!((layout.rows, layout.cols), (Some(2), Some(3)));
        assert_eq!(layout.fit_mode, Some(FitMode::Cover));
        assert_eq!(layout.align, Some(Align::Right));
        assert_eq!(layout.bg_color, Some(Background::Color("#202020".into())));
        assert_eq!(layout.exts, Some(vec!["mp4".to_string(), "mov".to_string()]));
        assert_eq!(output, Some(PathBuf::from("out.mp4")));
        assert_eq!(fps, Some(25.0));
        assert!(no_audio && dry_run);
    }

    #[test]
    fn test_input_dir_conflicts_with_positional() {
        assert!(parse(&["plan", "-i", "a"]).is_ok());
        let err = parse(&["plan", "a", "-i", "b"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_bad_enum_values_are_usage_errors() {
        assert_eq!(parse(&["stack", "--fit-mode", "stretch"]).unwrap_err().exit_code(), 2);
        assert_eq!(parse(&["stack", "--bg-color", "red;rm"]).unwrap_err().exit_code(), 2);
        assert_eq!(parse(&["stack", "-n", "-1"]).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn test_settings_fall_back_to_config() {
        let cli = parse(&["plan", "--input-dir", "shots"]).unwrap();
        let Commands::Plan { layout } = cli.command else {
            panic!("expected plan");
        };
        let mut config = AppConfig::default();
        config.defaults.fit_mode = "contain".into();
        config.defaults.gutter = 8;

        let settings = layout.resolve(&config).unwrap();
        assert_eq!(settings.dir, PathBuf::from("shots"));
        assert_eq!(settings.fit_mode, FitMode::Contain);
        assert_eq!(settings.gutter, 8);
        assert_eq!(settings.background, Background::default());

        config.defaults.align = "diagonal".into();
        assert!(layout.resolve(&config).unwrap_err().is_usage_error());
    }

    #[test]
    fn test_grid_spec_infers_missing_dimension() {
        let cli = parse(&["plan", "-m", "3", "--cell-width", "100"]).unwrap();
        let Commands::Plan { layout } = cli.command else {
            panic!("expected plan");
        };
        let spec = layout.resolve(&AppConfig::default()).unwrap().grid_spec(7);
        assert_eq!((spec.rows, spec.cols), (3, 3));
        assert_eq!(spec.cell_width, Some(100));
    }

    #[test]
    fn test_bad_config_falls_back_and_reports() {
        let path = std::env::temp_dir().join(format!("gridstack-cli-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"defaults": {"gutter": "wide"}}"#).unwrap();
        let (config, err) = load_config(Some(&path));
        assert_eq!(config.defaults.gutter, 0);
        assert!(err.is_some());

        std::fs::write(&path, r#"{"defaults": {"gutter": 6}}"#).unwrap();
        let (config, err) = load_config(Some(&path));
        assert_eq!(config.defaults.gutter, 6);
        assert!(err.is_none());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_exit_codes() {
        let usage: anyhow::Error = GridstackError::invalid_config("rows must be at least 1").into();
        assert_eq!(exit_code_for(&usage), 2);

        let runtime: anyhow::Error = GridstackError::empty_input("nothing").into();
        assert_eq!(exit_code_for(&runtime.context("while stacking")), 1);

        assert_eq!(exit_code_for(&anyhow::anyhow!("plain")), 1);
    }
}
