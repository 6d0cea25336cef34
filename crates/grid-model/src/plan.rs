//! Resolved layout.

use serde::{Deserialize, Serialize};

use crate::grid::FitMode;
use crate::item::{Item, Size};

/// An item with its resolved render size and canvas offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub item: Item,

    /// Zero-based grid row.
    pub row: u32,

    /// Zero-based grid column.
    pub col: u32,

    /// Left edge on the canvas.
    pub x: u32,

    /// Top edge on the canvas.
    pub y: u32,

    /// Width the item occupies on the canvas.
    pub render_width: u32,

    /// Height the item occupies on the canvas.
    pub render_height: u32,
}

impl PlacedItem {
    pub fn render_size(&self) -> Size {
        Size::new(self.render_width, self.render_height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.render_width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.render_height
    }

    /// Whether two placements share any pixel.
    pub fn overlaps(&self, other: &PlacedItem) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// The planner's output: canvas size plus every placement in row-major order.
///
/// Built once per invocation and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasPlan {
    /// Canvas width in pixels.
    pub width: u32,

    /// Canvas height in pixels.
    pub height: u32,

    /// Fit policy the plan was built for.
    pub fit_mode: FitMode,

    /// Shared cell size (`contain`/`cover` only).
    pub cell: Option<Size>,

    /// Placements in row-major order.
    pub items: Vec<PlacedItem>,

    /// Inputs left out because the grid was full.
    pub dropped: usize,
}

impl CanvasPlan {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rows that hold at least one item.
    pub fn rows_used(&self) -> u32 {
        self.items.last().map(|p| p.row + 1).unwrap_or(0)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(x: u32, y: u32, w: u32, h: u32) -> PlacedItem {
        PlacedItem {
            item: Item::new("a.png", w, h),
            row: 0,
            col: 0,
            x,
            y,
            render_width: w,
            render_height: h,
        }
    }

    #[test]
    fn test_overlap_is_edge_exclusive() {
        let a = placed(0, 0, 100, 100);
        let touching = placed(100, 0, 50, 100);
        let inside = placed(99, 99, 10, 10);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
        assert!(inside.overlaps(&a));
    }

    #[test]
    fn test_plan_json_round_trip() {
        let plan = CanvasPlan {
            width: 100,
            height: 80,
            fit_mode: FitMode::Tight,
            cell: None,
            items: vec![placed(0, 0, 100, 80)],
            dropped: 2,
        };
        let json = plan.to_json().unwrap();
        assert!(json.contains("\"fit_mode\": \"tight\""));
        let back: CanvasPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
        assert_eq!(back.rows_used(), 1);
    }
}
