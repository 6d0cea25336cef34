//! Media kinds recognized by file extension.

use std::path::Path;

use gridstack_common::error::{GridstackError, GridstackResult};
use serde::{Deserialize, Serialize};

/// Extensions treated as still images when used as inputs.
pub const STILL_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff"];

/// Frame rate used when neither the caller nor the probe provides one.
pub const DEFAULT_FPS: f64 = 30.0;

/// Whether the render produces one still frame or a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Image,
    Video,
}

/// Output container, derived from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
    Tiff,
    Mp4,
    Mov,
    Mkv,
    Webm,
    Gif,
}

impl OutputFormat {
    /// Infer the format from `path`'s extension.
    pub fn from_path(path: &Path) -> GridstackResult<Self> {
        let ext = extension_of(path).ok_or_else(|| {
            GridstackError::invalid_config(format!(
                "output {} has no file extension",
                path.display()
            ))
        })?;
        Ok(match ext.as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::Webp,
            "bmp" => Self::Bmp,
            "tif" | "tiff" => Self::Tiff,
            "mp4" | "m4v" => Self::Mp4,
            "mov" => Self::Mov,
            "mkv" => Self::Mkv,
            "webm" => Self::Webm,
            "gif" => Self::Gif,
            other => {
                return Err(GridstackError::invalid_config(format!(
                    "unsupported output extension '.{other}'"
                )))
            }
        })
    }

    pub fn kind(self) -> OutputKind {
        match self {
            Self::Png | Self::Jpeg | Self::Webp | Self::Bmp | Self::Tiff => OutputKind::Image,
            Self::Mp4 | Self::Mov | Self::Mkv | Self::Webm | Self::Gif => OutputKind::Video,
        }
    }

    /// Whether the encoded output can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Png | Self::Webp | Self::Tiff | Self::Webm)
    }
}

/// Lowercased extension of `path`, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Whether `path` names a still image rather than a video stream.
pub fn is_still_image(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| STILL_IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Pick the output frame rate: explicit value, then probed, then `fallback`.
pub fn resolve_fps(
    explicit: Option<f64>,
    probed: Option<f64>,
    fallback: f64,
) -> GridstackResult<f64> {
    if let Some(fps) = explicit {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(GridstackError::invalid_config(format!(
                "fps must be positive, got {fps}"
            )));
        }
        return Ok(fps);
    }
    if let Some(fps) = probed.filter(|f| f.is_finite() && *f > 0.0) {
        return Ok(fps);
    }
    if fallback.is_finite() && fallback > 0.0 {
        Ok(fallback)
    } else {
        Ok(DEFAULT_FPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out/grid.PNG")).unwrap(),
            OutputFormat::Png
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("grid.webm")).unwrap().kind(),
            OutputKind::Video
        );
        assert!(OutputFormat::from_path(Path::new("grid.xyz"))
            .unwrap_err()
            .is_usage_error());
        assert!(OutputFormat::from_path(Path::new("grid")).is_err());
    }

    #[test]
    fn test_alpha_support() {
        assert!(OutputFormat::Png.supports_alpha());
        assert!(OutputFormat::Webm.supports_alpha());
        assert!(!OutputFormat::Jpeg.supports_alpha());
        assert!(!OutputFormat::Mp4.supports_alpha());
    }

    #[test]
    fn test_still_image_detection() {
        assert!(is_still_image(Path::new("a/b/photo.JPG")));
        assert!(!is_still_image(Path::new("clip.mp4")));
        assert!(!is_still_image(Path::new("noext")));
    }

    #[test]
    fn test_fps_fallback_chain() {
        assert_eq!(resolve_fps(Some(24.0), Some(60.0), 30.0).unwrap(), 24.0);
        assert_eq!(resolve_fps(None, Some(29.97), 30.0).unwrap(), 29.97);
        assert_eq!(resolve_fps(None, None, 25.0).unwrap(), 25.0);
        assert_eq!(resolve_fps(None, Some(0.0), 0.0).unwrap(), DEFAULT_FPS);
        assert!(resolve_fps(Some(-1.0), None, 30.0).is_err());
    }
}
