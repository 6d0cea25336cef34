//! Render jobs and the ffmpeg backend.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use gridstack_common::config::EncodingDefaults;
use gridstack_common::error::{GridstackError, GridstackResult};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::compositor::CompositeProgram;
use crate::media::{is_still_image, OutputFormat, OutputKind};

/// Clip length used when a video is rendered from still images only.
pub const STILL_VIDEO_SECS: f64 = 5.0;

/// A compositing program bound to an output file.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Final output file path.
    pub output_path: PathBuf,

    /// Output container, derived from the path.
    pub format: OutputFormat,

    /// Output frame rate (video only).
    pub fps: f64,

    /// Keep the first input's audio track (video only).
    pub keep_audio: bool,

    /// Explicit output duration (video only).
    pub duration_secs: Option<f64>,

    /// Encoder settings.
    pub encoding: EncodingDefaults,

    /// Kill the backend after this long.
    pub timeout: Option<Duration>,
}

impl RenderJob {
    /// A job writing to `output_path`, with the format inferred from its extension.
    pub fn new(output_path: impl Into<PathBuf>) -> GridstackResult<Self> {
        let output_path = output_path.into();
        let format = OutputFormat::from_path(&output_path)?;
        Ok(Self {
            output_path,
            format,
            fps: crate::media::DEFAULT_FPS,
            keep_audio: true,
            duration_secs: None,
            encoding: EncodingDefaults::default(),
            timeout: None,
        })
    }

    pub fn kind(&self) -> OutputKind {
        self.format.kind()
    }

    /// Sibling path the backend writes to before the result is moved into place.
    pub fn staging_path(&self) -> PathBuf {
        let file_name = self
            .output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let ext = self
            .output_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        self.output_path
            .with_file_name(format!(".{file_name}.gridstack-partial{ext}"))
    }
}

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send + Sync>;

/// Render progress report.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// Output timestamp reached so far.
    pub out_time_secs: f64,

    /// Expected output length, when known.
    pub expected_secs: Option<f64>,

    /// Current stage.
    pub stage: RenderStage,
}

/// Stages of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
}

/// Trait for render backends.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Render `program` to `job.output_path`.
    async fn render(
        &self,
        job: &RenderJob,
        program: &CompositeProgram,
        progress: Option<ProgressCallback>,
    ) -> GridstackResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Render `program` with the system ffmpeg.
///
/// This is the main entry point for rendering.
pub async fn render_program(
    job: &RenderJob,
    program: &CompositeProgram,
    progress: Option<ProgressCallback>,
) -> GridstackResult<PathBuf> {
    let backend = FfmpegBackend::new();
    if !backend.is_available() {
        return Err(GridstackError::unsupported(
            "No supported render backend found (expected ffmpeg in PATH)",
        ));
    }
    render_with_backend(&backend, job, program, progress).await
}

/// Render through `backend`, publishing the output only on success.
///
/// The backend writes to [`RenderJob::staging_path`]; the file is renamed
/// onto the output path once the backend succeeds and removed otherwise.
pub async fn render_with_backend(
    backend: &dyn RenderBackend,
    job: &RenderJob,
    program: &CompositeProgram,
    progress: Option<ProgressCallback>,
) -> GridstackResult<PathBuf> {
    tracing::info!(
        output = %job.output_path.display(),
        format = ?job.format,
        canvas = %program.canvas_size(),
        inputs = program.steps.len(),
        "Starting render"
    );
    validate_job(job, program)?;

    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if let Some(cb) = &progress {
        cb(RenderProgress {
            out_time_secs: 0.0,
            expected_secs: job.duration_secs,
            stage: RenderStage::Preparing,
        });
    }

    let staging = job.staging_path();
    let staged_job = RenderJob {
        output_path: staging.clone(),
        ..job.clone()
    };

    tracing::info!(backend = backend.name(), "Using render backend");
    let started = std::time::Instant::now();
    let rendered = match job.timeout {
        Some(limit) => {
            match tokio::time::timeout(limit, backend.render(&staged_job, program, progress)).await
            {
                Ok(result) => result,
                Err(_) => Err(GridstackError::render(format!(
                    "{} did not finish within {}s",
                    backend.name(),
                    limit.as_secs_f64()
                ))),
            }
        }
        None => backend.render(&staged_job, program, progress).await,
    };

    if let Err(err) = rendered {
        discard_staging(&staging);
        return Err(err);
    }

    if !staging.is_file() {
        return Err(GridstackError::render(format!(
            "{} reported success but produced no output",
            backend.name()
        )));
    }
    if let Err(err) = std::fs::rename(&staging, &job.output_path) {
        discard_staging(&staging);
        return Err(err.into());
    }

    tracing::info!(
        output = %job.output_path.display(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Render finished"
    );
    Ok(job.output_path.clone())
}

fn discard_staging(staging: &Path) {
    if staging.exists() {
        if let Err(err) = std::fs::remove_file(staging) {
            tracing::warn!(error = %err, path = %staging.display(), "Failed to remove partial output");
        }
    }
}

fn validate_job(job: &RenderJob, program: &CompositeProgram) -> GridstackResult<()> {
    if program.steps.is_empty() {
        return Err(GridstackError::empty_input("nothing to composite"));
    }
    if program.canvas.width == 0 || program.canvas.height == 0 {
        return Err(GridstackError::invalid_config(format!(
            "canvas {} is empty",
            program.canvas_size()
        )));
    }
    if program.canvas.background.is_transparent() && !job.format.supports_alpha() {
        return Err(GridstackError::invalid_config(format!(
            "transparent background needs an output with alpha (png, webp, tiff, webm), got {:?}",
            job.format
        )));
    }
    if job.kind() == OutputKind::Video && !(job.fps.is_finite() && job.fps > 0.0) {
        return Err(GridstackError::invalid_config(format!(
            "fps must be positive, got {}",
            job.fps
        )));
    }
    if let Some(d) = job.duration_secs {
        if !(d.is_finite() && d > 0.0) {
            return Err(GridstackError::invalid_config(format!(
                "duration must be positive, got {d}"
            )));
        }
    }
    Ok(())
}

/// Renders by spawning the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: String,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::with_binary("ffmpeg")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run_ffmpeg(
        &self,
        args: &[String],
        expected_secs: Option<f64>,
        progress: Option<ProgressCallback>,
    ) -> GridstackResult<()> {
        tracing::debug!(args = ?args, "Running ffmpeg");
        let mut child = tokio::process::Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GridstackError::render(format!("Failed to start {}: {e}", self.binary)))?;

        tracing::info!(pid = ?child.id(), args_len = args.len(), "ffmpeg process started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GridstackError::render("Failed to capture ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| GridstackError::render("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently to avoid ffmpeg blocking on a full stderr pipe.
        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            match stderr.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut state = ProgressState::default();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| GridstackError::render(format!("Failed reading ffmpeg progress: {e}")))?
        {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key == "progress" {
                if let Some(cb) = &progress {
                    cb(RenderProgress {
                        out_time_secs: state.out_time_secs,
                        expected_secs,
                        stage: if state.complete {
                            RenderStage::Finalizing
                        } else {
                            RenderStage::Rendering
                        },
                    });
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| GridstackError::render(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .await
            .map_err(|e| GridstackError::Other(anyhow::anyhow!("stderr reader panicked: {e}")))?;

        if !status.success() {
            return Err(GridstackError::render(format!(
                "ffmpeg failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        if let Some(cb) = &progress {
            cb(RenderProgress {
                out_time_secs: state.out_time_secs,
                expected_secs,
                stage: RenderStage::Complete,
            });
        }
        Ok(())
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderBackend for FfmpegBackend {
    async fn render(
        &self,
        job: &RenderJob,
        program: &CompositeProgram,
        progress: Option<ProgressCallback>,
    ) -> GridstackResult<()> {
        let args = build_ffmpeg_args(job, program)?;
        tracing::info!(
            filter_len = args
                .iter()
                .position(|a| a == "-filter_complex")
                .and_then(|i| args.get(i + 1))
                .map_or(0, String::len),
            "ffmpeg command built"
        );
        self.run_ffmpeg(&args, output_duration(job, program), progress)
            .await
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Build the complete ffmpeg argument vector for `job`.
pub fn build_ffmpeg_args(job: &RenderJob, program: &CompositeProgram) -> GridstackResult<Vec<String>> {
    validate_job(job, program)?;
    let kind = job.kind();

    let mut args: Vec<String> = [
        "-hide_banner",
        "-nostdin",
        "-y",
        "-loglevel",
        "error",
        "-progress",
        "pipe:1",
        "-nostats",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for step in &program.steps {
        if kind == OutputKind::Video && is_still_image(&step.source) {
            args.push("-loop".to_string());
            args.push("1".to_string());
        }
        args.push("-i".to_string());
        args.push(step.source.display().to_string());
    }

    args.push("-filter_complex".to_string());
    args.push(build_filter_graph(job, program));
    args.push("-map".to_string());
    args.push("[vout]".to_string());

    match kind {
        OutputKind::Image => {
            args.push("-frames:v".to_string());
            args.push("1".to_string());
            if job.format == OutputFormat::Jpeg {
                args.push("-q:v".to_string());
                args.push("2".to_string());
            }
        }
        OutputKind::Video => {
            args.push("-r".to_string());
            args.push(format_number(job.fps));
            if let Some(secs) = output_duration(job, program) {
                args.push("-t".to_string());
                args.push(format!("{secs:.3}"));
            }
            let with_audio = job.keep_audio
                && job.format != OutputFormat::Gif
                && program
                    .steps
                    .first()
                    .is_some_and(|s| !is_still_image(&s.source));
            if with_audio {
                args.push("-map".to_string());
                args.push("0:a?".to_string());
            }
            args.append(&mut codec_args(job, with_audio));
        }
    }

    args.push(job.output_path.display().to_string());
    Ok(args)
}

/// Output length passed as `-t`: the explicit duration, or a fixed clip
/// length when every input is a looped still image.
fn output_duration(job: &RenderJob, program: &CompositeProgram) -> Option<f64> {
    if job.kind() != OutputKind::Video {
        return None;
    }
    job.duration_secs.or_else(|| {
        program
            .sources()
            .all(|p| is_still_image(p))
            .then_some(STILL_VIDEO_SECS)
    })
}

/// Build the `-filter_complex` graph: canvas source, per-input fit chains,
/// chained overlays in program order, and a final output adapter.
pub fn build_filter_graph(job: &RenderJob, program: &CompositeProgram) -> String {
    let video = job.kind() == OutputKind::Video;
    let canvas = &program.canvas;
    let mut parts = Vec::with_capacity(program.steps.len() * 2 + 2);

    let mut base = format!(
        "color=c={color}:s={w}x{h}",
        color = canvas.background.ffmpeg_color(),
        w = canvas.width,
        h = canvas.height,
    );
    if video {
        base.push_str(&format!(":r={}", format_number(job.fps)));
    }
    if canvas.background.is_transparent() {
        base.push_str(",format=rgba");
    }
    parts.push(format!("{base}[base0]"));

    let last = program.steps.len().saturating_sub(1);
    for (i, step) in program.steps.iter().enumerate() {
        let mut chain = Vec::new();
        if video && !is_still_image(&step.source) {
            chain.push("setpts=PTS-STARTPTS".to_string());
        }
        if let Some(fit) = step.transform.filter_chain() {
            chain.push(fit);
        }

        let source = if chain.is_empty() {
            format!("{}:v", step.input_index)
        } else {
            parts.push(format!(
                "[{}:v]{}[v{i}]",
                step.input_index,
                chain.join(",")
            ));
            format!("v{i}")
        };

        let target = if i == last {
            "composed".to_string()
        } else {
            format!("base{}", i + 1)
        };
        parts.push(format!(
            "[base{i}][{source}]overlay=x={x}:y={y}{shortest}[{target}]",
            x = step.x,
            y = step.y,
            shortest = if video { ":shortest=1" } else { "" },
        ));
    }

    parts.push(format!("[composed]{}[vout]", output_adapter(job, canvas.background.is_transparent())));
    parts.join(";")
}

fn output_adapter(job: &RenderJob, transparent: bool) -> &'static str {
    match job.format {
        OutputFormat::Gif => "split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse",
        OutputFormat::Webm if transparent => "pad=ceil(iw/2)*2:ceil(ih/2)*2:color=black@0.0,format=yuva420p",
        OutputFormat::Mp4 | OutputFormat::Mov | OutputFormat::Mkv | OutputFormat::Webm => {
            "pad=ceil(iw/2)*2:ceil(ih/2)*2,format=yuv420p"
        }
        _ if transparent => "format=rgba",
        _ => "null",
    }
}

fn codec_args(job: &RenderJob, with_audio: bool) -> Vec<String> {
    let enc = &job.encoding;
    let audio_bitrate = format!("{}k", enc.audio_bitrate_kbps.max(64));
    let mut args: Vec<String> = match job.format {
        OutputFormat::Mp4 | OutputFormat::Mov | OutputFormat::Mkv => vec![
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            enc.preset.clone(),
            "-crf".to_string(),
            enc.crf.to_string(),
        ],
        OutputFormat::Webm => vec![
            "-c:v".to_string(),
            "libvpx-vp9".to_string(),
            "-crf".to_string(),
            enc.crf.to_string(),
            "-b:v".to_string(),
            "0".to_string(),
        ],
        OutputFormat::Gif => vec!["-loop".to_string(), "0".to_string()],
        _ => Vec::new(),
    };

    if with_audio {
        let codec = if job.format == OutputFormat::Webm {
            "libopus"
        } else {
            "aac"
        };
        args.extend([
            "-c:a".to_string(),
            codec.to_string(),
            "-b:a".to_string(),
            audio_bitrate,
        ]);
    }

    if matches!(job.format, OutputFormat::Mp4 | OutputFormat::Mov) {
        args.push("-movflags".to_string());
        args.push("+faststart".to_string());
    }
    args
}

/// `30` for whole numbers, `29.97` otherwise.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let s = format!("{value:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Whether `binary` resolves on `PATH` (or exists, when given as a path).
pub fn command_exists(binary: &str) -> bool {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(binary).is_file();
    }
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both names.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}
