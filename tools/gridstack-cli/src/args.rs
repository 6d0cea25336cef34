//! Layout flags shared by `stack` and `plan`.

use std::path::PathBuf;

use clap::Args;
use gridstack_common::config::AppConfig;
use gridstack_common::error::GridstackResult;
use gridstack_grid_model::{Align, Background, FitMode, GridSpec};

use crate::inputs::Discovery;

#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Directory holding the input files
    #[arg(value_name = "DIR", conflicts_with = "input_dir")]
    pub dir: Option<PathBuf>,

    /// Directory holding the input files (alternative to DIR)
    #[arg(short = 'i', long)]
    pub input_dir: Option<PathBuf>,

    /// Number of rows (inferred when omitted)
    #[arg(short = 'n', long)]
    pub rows: Option<u32>,

    /// Number of columns (inferred when omitted)
    #[arg(short = 'm', long)]
    pub cols: Option<u32>,

    /// How items are fitted: tight, contain or cover
    #[arg(long)]
    pub fit_mode: Option<FitMode>,

    /// Cell width for contain/cover
    #[arg(long)]
    pub cell_width: Option<u32>,

    /// Cell height for contain/cover
    #[arg(long)]
    pub cell_height: Option<u32>,

    /// Pixels between adjacent cells
    #[arg(long)]
    pub gutter: Option<u32>,

    /// Horizontal alignment of short rows: left, center or right
    #[arg(long)]
    pub align: Option<Align>,

    /// Canvas background: ffmpeg color name, #RRGGBB or transparent
    #[arg(long)]
    pub bg_color: Option<Background>,

    /// Comma separated input extensions
    #[arg(long, value_delimiter = ',')]
    pub exts: Option<Vec<String>>,

    /// Use at most this many input files
    #[arg(long)]
    pub limit: Option<usize>,

    /// Search subdirectories too
    #[arg(long)]
    pub recursive: bool,
}

/// Layout settings after flags are merged over the configuration.
#[derive(Debug, Clone)]
pub struct LayoutSettings {
    pub dir: PathBuf,
    pub rows: Option<u32>,
    pub cols: Option<u32>,
    pub fit_mode: FitMode,
    pub align: Align,
    pub gutter: u32,
    pub cell_width: Option<u32>,
    pub cell_height: Option<u32>,
    pub background: Background,
    pub discovery: Discovery,
}

impl LayoutArgs {
    /// Merge flags over `config`. Invalid configured values are usage errors.
    pub fn resolve(&self, config: &AppConfig) -> GridstackResult<LayoutSettings> {
        let defaults = &config.defaults;

        let fit_mode = match self.fit_mode {
            Some(mode) => mode,
            None => defaults.fit_mode.parse()?,
        };
        let align = match self.align {
            Some(align) => align,
            None => defaults.align.parse()?,
        };
        let background = match &self.bg_color {
            Some(bg) => bg.clone(),
            None => defaults.bg_color.parse()?,
        };

        let mut discovery = Discovery::new(self.exts.as_deref().unwrap_or(&defaults.exts));
        discovery.recursive = self.recursive;
        discovery.limit = self.limit;

        Ok(LayoutSettings {
            dir: self
                .dir
                .clone()
                .or_else(|| self.input_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            rows: self.rows,
            cols: self.cols,
            fit_mode,
            align,
            gutter: self.gutter.unwrap_or(defaults.gutter),
            cell_width: self.cell_width,
            cell_height: self.cell_height,
            background,
            discovery,
        })
    }
}

impl LayoutSettings {
    /// Grid spec for `count` inputs, inferring any missing dimension.
    pub fn grid_spec(&self, count: usize) -> GridSpec {
        let (rows, cols) = gridstack_layout_core::auto_shape(self.rows, self.cols, count);
        GridSpec::new(rows, cols)
            .with_gutter(self.gutter)
            .with_align(self.align)
            .with_fit_mode(self.fit_mode)
            .with_cell_size(self.cell_width, self.cell_height)
    }
}
