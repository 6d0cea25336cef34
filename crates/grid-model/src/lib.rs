//! Gridstack Grid Model
//!
//! Defines the data contracts shared by the layout planner and the renderer:
//! - **Item:** One probed input with its native pixel size
//! - **GridSpec:** Rows, columns, gutter, alignment, fit mode, cell size
//! - **Background:** Canvas fill (ffmpeg color or transparent)
//! - **CanvasPlan:** The resolved, immutable layout consumed by rendering
//!
//! All sizes and offsets are integer pixels with the origin at the
//! top-left corner of the canvas.

pub mod background;
pub mod grid;
pub mod item;
pub mod plan;

pub use background::*;
pub use grid::*;
pub use item::*;
pub use plan::*;
