//! Geometry probing through external tools.
//!
//! Probers only read their inputs. A failure aborts the whole batch, so
//! callers never lay out a partially probed set.

use std::path::{Path, PathBuf};
use std::process::Command;

use gridstack_common::error::{GridstackError, GridstackResult};
use gridstack_grid_model::{Item, Size};

/// Returns an input's native pixel size.
pub trait GeometryProber {
    /// Probe `path`; fails with a probe error when the source is unreadable
    /// or reports non-positive dimensions.
    fn probe(&self, path: &Path) -> GridstackResult<Size>;

    /// Prober name for logs.
    fn name(&self) -> &str;
}

/// Probes the first video stream with `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: String,
}

impl FfprobeProber {
    pub fn new() -> Self {
        Self::with_binary("ffprobe")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Frame rate of the first video stream, if it reports a usable one.
    pub fn probe_frame_rate(&self, path: &Path) -> Option<f64> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=r_frame_rate",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }
        let raw = String::from_utf8(output.stdout).ok()?;
        parse_frame_rate(raw.lines().next()?)
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProber for FfprobeProber {
    fn probe(&self, path: &Path) -> GridstackResult<Size> {
        ensure_exists(path)?;
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "csv=p=0:s=x",
            ])
            .arg(path)
            .output()
            .map_err(|e| GridstackError::probe(path, format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(GridstackError::probe(
                path,
                format!(
                    "{} exited with {}: {}",
                    self.binary,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        parse_dimensions(&raw, 'x').ok_or_else(|| {
            GridstackError::probe(path, format!("unparseable dimensions '{}'", raw.trim()))
        })
    }

    fn name(&self) -> &str {
        "ffprobe"
    }
}

/// Probes with ImageMagick's `identify` (first frame only).
#[derive(Debug, Clone)]
pub struct IdentifyProber {
    binary: String,
}

impl IdentifyProber {
    pub fn new() -> Self {
        Self::with_binary("identify")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for IdentifyProber {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProber for IdentifyProber {
    fn probe(&self, path: &Path) -> GridstackResult<Size> {
        ensure_exists(path)?;
        let mut frame = path.as_os_str().to_owned();
        frame.push("[0]");

        let output = Command::new(&self.binary)
            .args(["-format", "%w %h"])
            .arg(&frame)
            .output()
            .map_err(|e| GridstackError::probe(path, format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(GridstackError::probe(
                path,
                format!(
                    "{} exited with {}: {}",
                    self.binary,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        parse_dimensions(&raw, ' ').ok_or_else(|| {
            GridstackError::probe(path, format!("unparseable dimensions '{}'", raw.trim()))
        })
    }

    fn name(&self) -> &str {
        "identify"
    }
}

/// Tries each prober in order and returns the first success.
pub struct ChainProber {
    probers: Vec<Box<dyn GeometryProber + Send + Sync>>,
}

impl ChainProber {
    pub fn new(probers: Vec<Box<dyn GeometryProber + Send + Sync>>) -> Self {
        Self { probers }
    }

    /// `ffprobe`, then `identify`.
    pub fn system_default() -> Self {
        Self::new(vec![
            Box::new(FfprobeProber::new()),
            Box::new(IdentifyProber::new()),
        ])
    }
}

impl GeometryProber for ChainProber {
    fn probe(&self, path: &Path) -> GridstackResult<Size> {
        let mut last_err = None;
        for prober in &self.probers {
            match prober.probe(path) {
                Ok(size) => return Ok(size),
                Err(err) => {
                    tracing::debug!(
                        prober = prober.name(),
                        path = %path.display(),
                        error = %err,
                        "Prober failed, trying next"
                    );
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| GridstackError::probe(path, "no probers configured")))
    }

    fn name(&self) -> &str {
        "chain"
    }
}

/// Probe every path in order, stopping at the first failure.
pub fn probe_items(prober: &dyn GeometryProber, paths: &[PathBuf]) -> GridstackResult<Vec<Item>> {
    let started = std::time::Instant::now();
    let items = paths
        .iter()
        .map(|path| {
            let size = prober.probe(path)?;
            tracing::debug!(path = %path.display(), size = %size, "Probed input");
            Ok(Item::new(path.clone(), size.width, size.height))
        })
        .collect::<GridstackResult<Vec<_>>>()?;

    tracing::info!(
        prober = prober.name(),
        items = items.len(),
        probe_ms = started.elapsed().as_millis(),
        "Inputs probed"
    );
    Ok(items)
}

/// Parse `"<w><sep><h>"` from the first non-empty line; zero is rejected.
pub fn parse_dimensions(raw: &str, sep: char) -> Option<Size> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (w, h) = line.split_once(sep)?;
    let width = w.trim().parse::<u32>().ok()?;
    // ffprobe may append a trailing separator for extra entries.
    let height = h.trim().trim_end_matches(sep).parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(Size::new(width, height))
}

/// Parse ffprobe's `r_frame_rate` (`30000/1001` or `25`).
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.parse::<f64>().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

fn ensure_exists(path: &Path) -> GridstackResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(GridstackError::probe(path, "file does not exist"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedProber(HashMap<PathBuf, Size>);

    impl GeometryProber for FixedProber {
        fn probe(&self, path: &Path) -> GridstackResult<Size> {
            self.0
                .get(path)
                .copied()
                .ok_or_else(|| GridstackError::probe(path, "unknown"))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_parse_ffprobe_output() {
        assert_eq!(parse_dimensions("1920x1080\n", 'x'), Some(Size::new(1920, 1080)));
        assert_eq!(parse_dimensions("\n640x480x\n", 'x'), Some(Size::new(640, 480)));
        assert_eq!(parse_dimensions("0x480", 'x'), None);
        assert_eq!(parse_dimensions("N/AxN/A", 'x'), None);
        assert_eq!(parse_dimensions("", 'x'), None);
    }

    #[test]
    fn test_parse_identify_output() {
        assert_eq!(parse_dimensions("800 600", ' '), Some(Size::new(800, 600)));
        assert_eq!(parse_dimensions("800", ' '), None);
    }

    #[test]
    fn test_parse_frame_rate() {
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("garbage"), None);
    }

    #[test]
    fn test_probe_items_preserves_order_and_aborts() {
        let mut sizes = HashMap::new();
        sizes.insert(PathBuf::from("b.png"), Size::new(20, 10));
        sizes.insert(PathBuf::from("a.png"), Size::new(10, 20));
        let prober = FixedProber(sizes);

        let items = probe_items(&prober, &["b.png".into(), "a.png".into()]).unwrap();
        assert_eq!(items[0].path, PathBuf::from("b.png"));
        assert_eq!(items[1].size(), Size::new(10, 20));

        let err = probe_items(&prober, &["a.png".into(), "c.png".into()]).unwrap_err();
        assert!(matches!(err, GridstackError::Probe { .. }));
    }

    #[test]
    fn test_missing_file_fails_before_spawning() {
        let prober = FfprobeProber::with_binary("/nonexistent/ffprobe");
        let err = prober
            .probe(Path::new("/nonexistent/input.png"))
            .unwrap_err();
        assert!(err.to_string().contains("file does not exist"));
    }

    #[test]
    fn test_chain_returns_last_error() {
        let chain = ChainProber::new(vec![
            Box::new(FfprobeProber::with_binary("/nonexistent/ffprobe")),
            Box::new(IdentifyProber::with_binary("/nonexistent/identify")),
        ]);
        assert!(matches!(
            chain.probe(Path::new("/nonexistent/x.png")),
            Err(GridstackError::Probe { .. })
        ));
    }
}
