//! Gridstack Render Engine
//!
//! Turns a canvas plan into a finished image or video through ffmpeg.
//!
//! # Pipeline Architecture
//!
//! ```text
//! inputs ── probe (ffprobe / identify) ──┐
//!                                        ├── layout (gridstack-layout-core)
//! grid spec ─────────────────────────────┘         │
//!                                                  ▼
//!                                           CompositeProgram
//!                                    (canvas + fit + overlay steps)
//!                                                  │
//!                                                  ▼
//!                                  ffmpeg -filter_complex (staging file)
//!                                                  │
//!                                                  ▼
//!                                           rename → output
//! ```

pub mod compositor;
pub mod export;
pub mod media;
pub mod probe;

pub use compositor::*;
pub use export::*;
pub use media::*;
pub use probe::*;
