//! Render a grid of inputs to one image or video.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gridstack_common::config::AppConfig;
use gridstack_common::error::GridstackResult;
use gridstack_render_engine::{
    build_ffmpeg_args, build_program, is_still_image, render_program, resolve_fps, ChainProber,
    FfprobeProber, OutputFormat, ProgressCallback, RenderJob, RenderProgress, RenderStage,
};

use crate::args::LayoutSettings;
use crate::commands::prepare;

/// Render options beyond the layout.
#[derive(Debug, Clone, Default)]
pub struct StackOptions {
    pub output: Option<PathBuf>,
    pub fps: Option<f64>,
    pub no_audio: bool,
    pub timeout_secs: Option<u64>,
    pub dry_run: bool,
    pub quiet: bool,
}

pub async fn run(
    mut settings: LayoutSettings,
    options: StackOptions,
    config: &AppConfig,
) -> anyhow::Result<()> {
    // Reject an unknown output extension before touching any input.
    if let Some(output) = &options.output {
        OutputFormat::from_path(output)?;
    }

    settings.discovery.exclude = match &options.output {
        Some(output) => vec![output.clone()],
        None => vec![
            settings.dir.join("stack.png"),
            settings.dir.join("stack.mp4"),
        ],
    };

    let prepared = prepare(&settings, &ChainProber::system_default())?;
    let sources: Vec<&Path> = prepared.plan.items.iter().map(|p| p.item.path.as_path()).collect();

    let output_path = options
        .output
        .clone()
        .unwrap_or_else(|| default_output(&settings.dir, &sources));
    let mut job = RenderJob::new(&output_path)?;
    job.keep_audio = !options.no_audio;
    job.encoding = config.encoding.clone();
    job.timeout = options
        .timeout_secs
        .or(config.timeout_secs)
        .map(Duration::from_secs);
    job.fps = pick_fps(options.fps, &sources, config)?;

    let program = build_program(&prepared.plan, &settings.background)?;

    if options.dry_run {
        let args = build_ffmpeg_args(&job, &program)?;
        println!("ffmpeg {}", shell_join(&args));
        return Ok(());
    }

    if !options.quiet {
        eprintln!(
            "Stacking {} input(s) into {}x{} ({} x {}, {})",
            prepared.plan.len(),
            prepared.plan.width,
            prepared.plan.height,
            prepared.spec.rows,
            prepared.spec.cols,
            prepared.spec.fit_mode,
        );
        if prepared.plan.dropped > 0 {
            eprintln!(
                "  {} of {} input(s) did not fit and were skipped",
                prepared.plan.dropped,
                prepared.discovered.len()
            );
        }
    }

    let progress = (!options.quiet).then(progress_printer);
    let written = render_program(&job, &program, progress).await?;

    if !options.quiet {
        eprintln!();
    }
    println!("{}", written.display());
    Ok(())
}

/// `<dir>/stack.mp4` when any source is a video, `<dir>/stack.png` otherwise.
pub fn default_output(dir: &Path, sources: &[&Path]) -> PathBuf {
    if sources.iter().any(|p| !is_still_image(p)) {
        dir.join("stack.mp4")
    } else {
        dir.join("stack.png")
    }
}

/// Explicit rate, then the first video input's rate, then the configured fallback.
fn pick_fps(explicit: Option<f64>, sources: &[&Path], config: &AppConfig) -> GridstackResult<f64> {
    let probed = match (explicit, sources.first()) {
        (None, Some(first)) if !is_still_image(first) => {
            FfprobeProber::new().probe_frame_rate(first)
        }
        _ => None,
    };
    resolve_fps(explicit, probed, config.defaults.fallback_fps)
}

fn progress_printer() -> ProgressCallback {
    Box::new(|p: RenderProgress| {
        let line = match (p.stage, p.expected_secs) {
            (RenderStage::Rendering, Some(total)) if total > 0.0 => format!(
                "\r  Rendering: {:.1}% ({:.1}s of {:.1}s)  ",
                (p.out_time_secs / total * 100.0).min(100.0),
                p.out_time_secs,
                total
            ),
            (RenderStage::Rendering, _) => format!("\r  Rendering: {:.1}s  ", p.out_time_secs),
            (stage, _) => format!("\r  {stage:?}...  "),
        };
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    })
}

/// Quote arguments for display as a shell command line.
pub fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            let plain = !arg.is_empty()
                && arg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c));
            if plain {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
