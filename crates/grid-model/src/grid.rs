//! Grid specification: shape, spacing, and fit policy.

use std::str::FromStr;

use gridstack_common::error::{GridstackError, GridstackResult};
use serde::{Deserialize, Serialize};

/// Smallest accepted cell dimension in pixels.
///
/// Encoders reject 1px planes for subsampled pixel formats.
pub const MIN_CELL_SIZE: u32 = 2;

/// How an item's pixels map onto its allotted space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Every item keeps its native size; rows are packed.
    #[default]
    Tight,
    /// Scale preserving aspect ratio to fit inside the cell, pad the rest.
    Contain,
    /// Scale preserving aspect ratio to fill the cell, crop the overflow.
    Cover,
}

impl FitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tight => "tight",
            Self::Contain => "contain",
            Self::Cover => "cover",
        }
    }

    /// Whether every item shares one cell size.
    pub fn uses_cells(self) -> bool {
        !matches!(self, Self::Tight)
    }
}

impl FromStr for FitMode {
    type Err = GridstackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tight" => Ok(Self::Tight),
            "contain" => Ok(Self::Contain),
            "cover" => Ok(Self::Cover),
            other => Err(GridstackError::invalid_config(format!(
                "unknown fit mode '{other}' (expected tight, contain, or cover)"
            ))),
        }
    }
}

impl std::fmt::Display for FitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal alignment of an under-filled row in `tight` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Start offset of a row of `row_width` inside a canvas of `canvas_width`.
    ///
    /// Centering uses integer division, so odd slack leaves the extra pixel
    /// on the right.
    pub fn row_start(self, canvas_width: u32, row_width: u32) -> u32 {
        let slack = canvas_width.saturating_sub(row_width);
        match self {
            Self::Left => 0,
            Self::Center => slack / 2,
            Self::Right => slack,
        }
    }
}

impl FromStr for Align {
    type Err = GridstackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" | "centre" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            other => Err(GridstackError::invalid_config(format!(
                "unknown alignment '{other}' (expected left, center, or right)"
            ))),
        }
    }
}

impl std::fmt::Display for Align {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested grid shape and fit policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of rows (>= 1).
    pub rows: u32,

    /// Number of columns (>= 1).
    pub cols: u32,

    /// Pixels between adjacent cells and rows.
    pub gutter: u32,

    /// Row alignment (only meaningful in `tight` mode).
    pub align: Align,

    /// Fit policy.
    pub fit_mode: FitMode,

    /// Explicit cell width; falls back to the first item's width.
    pub cell_width: Option<u32>,

    /// Explicit cell height; falls back to the first item's height.
    pub cell_height: Option<u32>,
}

impl GridSpec {
    /// A `rows` x `cols` tight grid with no gutter.
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            gutter: 0,
            align: Align::default(),
            fit_mode: FitMode::default(),
            cell_width: None,
            cell_height: None,
        }
    }

    pub fn with_gutter(mut self, gutter: u32) -> Self {
        self.gutter = gutter;
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_fit_mode(mut self, fit_mode: FitMode) -> Self {
        self.fit_mode = fit_mode;
        self
    }

    pub fn with_cell_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.cell_width = width;
        self.cell_height = height;
        self
    }

    /// Maximum number of items the grid holds.
    pub fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Reject shapes that cannot produce a canvas.
    pub fn validate(&self) -> GridstackResult<()> {
        if self.rows < 1 {
            return Err(GridstackError::invalid_config("rows must be at least 1"));
        }
        if self.cols < 1 {
            return Err(GridstackError::invalid_config("cols must be at least 1"));
        }
        for (name, value) in [
            ("cell width", self.cell_width),
            ("cell height", self.cell_height),
        ] {
            if let Some(v) = value {
                if v < MIN_CELL_SIZE {
                    return Err(GridstackError::invalid_config(format!(
                        "{name} must be at least {MIN_CELL_SIZE}px, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}
