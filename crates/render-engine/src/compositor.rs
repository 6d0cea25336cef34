//! Compositing program: the ordered operations a render backend executes.
//!
//! A program is built once from a [`CanvasPlan`] before any process is
//! spawned. Backends only translate it; they never re-derive layout.

use std::path::PathBuf;

use gridstack_common::error::{GridstackError, GridstackResult};
use gridstack_grid_model::{Background, CanvasPlan, FitMode, Size};
use serde::Serialize;

/// Blank canvas allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasOp {
    pub width: u32,
    pub height: u32,
    pub background: Background,
}

/// Per-item pixel fitting applied before the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FitTransform {
    /// Native size, no filtering.
    None,

    /// Scale to fit inside the cell, then pad to the cell with `pad`.
    Contain {
        width: u32,
        height: u32,
        pad: Background,
    },

    /// Scale to fill the cell, then crop the center.
    Cover { width: u32, height: u32 },
}

impl FitTransform {
    /// ffmpeg filter chain for this transform, or `None` for pass-through.
    pub fn filter_chain(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Contain { width, height, pad } => {
                let alpha = if pad.is_transparent() {
                    "format=rgba,"
                } else {
                    ""
                };
                Some(format!(
                    "scale={width}:{height}:force_original_aspect_ratio=decrease,{alpha}pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color={color}",
                    color = pad.ffmpeg_color(),
                ))
            }
            Self::Cover { width, height } => Some(format!(
                "scale={width}:{height}:force_original_aspect_ratio=increase,crop={width}:{height}"
            )),
        }
    }
}

/// One input fitted and drawn onto the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeStep {
    /// Position of the source among the backend's inputs.
    pub input_index: usize,

    /// Source file.
    pub source: PathBuf,

    pub transform: FitTransform,

    /// Overlay offset on the canvas.
    pub x: u32,
    pub y: u32,
}

/// Canvas allocation followed by overlays in draw order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeProgram {
    pub canvas: CanvasOp,
    pub steps: Vec<CompositeStep>,
}

impl CompositeProgram {
    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas.width, self.canvas.height)
    }

    pub fn sources(&self) -> impl Iterator<Item = &PathBuf> {
        self.steps.iter().map(|s| &s.source)
    }
}

/// Translate `plan` into a compositing program over `background`.
pub fn build_program(plan: &CanvasPlan, background: &Background) -> GridstackResult<CompositeProgram> {
    if plan.is_empty() {
        return Err(GridstackError::empty_input("canvas plan has no items"));
    }

    let steps = plan
        .items
        .iter()
        .enumerate()
        .map(|(input_index, placed)| {
            let transform = match plan.fit_mode {
                FitMode::Tight => FitTransform::None,
                FitMode::Contain => FitTransform::Contain {
                    width: placed.render_width,
                    height: placed.render_height,
                    pad: background.clone(),
                },
                FitMode::Cover => FitTransform::Cover {
                    width: placed.render_width,
                    height: placed.render_height,
                },
            };
            CompositeStep {
                input_index,
                source: placed.item.path.clone(),
                transform,
                x: placed.x,
                y: placed.y,
            }
        })
        .collect();

    Ok(CompositeProgram {
        canvas: CanvasOp {
            width: plan.width,
            height: plan.height,
            background: background.clone(),
        },
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstack_grid_model::{GridSpec, Item};
    use gridstack_layout_core::plan_layout;

    fn items() -> Vec<Item> {
        vec![
            Item::new("a.mp4", 1920, 1080),
            Item::new("b.mp4", 1080, 1920),
            Item::new("c.mp4", 640, 480),
        ]
    }

    #[test]
    fn test_steps_follow_plan_order() {
        let spec = GridSpec::new(2, 2)
            .with_fit_mode(FitMode::Cover)
            .with_cell_size(Some(320), Some(180))
            .with_gutter(4);
        let plan = plan_layout(&spec, &items()).unwrap();
        let program = build_program(&plan, &Background::default()).unwrap();

        assert_eq!(program.canvas_size(), Size::new(644, 364));
        let positions: Vec<(usize, u32, u32)> = program
            .steps
            .iter()
            .map(|s| (s.input_index, s.x, s.y))
            .collect();
        assert_eq!(positions, vec![(0, 0, 0), (1, 324, 0), (2, 0, 184)]);
        assert_eq!(
            program.sources().map(|p| p.to_str().unwrap()).collect::<Vec<_>>(),
            vec!["a.mp4", "b.mp4", "c.mp4"]
        );
    }

    #[test]
    fn test_tight_has_no_transform() {
        let plan = plan_layout(&GridSpec::new(1, 3), &items()).unwrap();
        let program = build_program(&plan, &Background::default()).unwrap();
        assert!(program
            .steps
            .iter()
            .all(|s| s.transform == FitTransform::None && s.transform.filter_chain().is_none()));
    }

    #[test]
    fn test_contain_chain_pads_with_background() {
        let t = FitTransform::Contain {
            width: 320,
            height: 180,
            pad: "#202020".parse().unwrap(),
        };
        assert_eq!(
            t.filter_chain().unwrap(),
            "scale=320:180:force_original_aspect_ratio=decrease,pad=320:180:(ow-iw)/2:(oh-ih)/2:color=#202020"
        );

        let transparent = FitTransform::Contain {
            width: 10,
            height: 10,
            pad: Background::Transparent,
        };
        let chain = transparent.filter_chain().unwrap();
        assert!(chain.contains("format=rgba,pad=10:10"));
        assert!(chain.ends_with("color=black@0.0"));
    }

    #[test]
    fn test_cover_chain_crops_center() {
        let t = FitTransform::Cover {
            width: 200,
            height: 100,
        };
        assert_eq!(
            t.filter_chain().unwrap(),
            "scale=200:100:force_original_aspect_ratio=increase,crop=200:100"
        );
    }

    #[test]
    fn test_empty_plan_is_rejected() {
        let plan = CanvasPlan {
            width: 10,
            height: 10,
            fit_mode: FitMode::Tight,
            cell: None,
            items: vec![],
            dropped: 0,
        };
        assert!(matches!(
            build_program(&plan, &Background::default()),
            Err(GridstackError::EmptyInput { .. })
        ));
    }
}
