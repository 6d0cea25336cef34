//! Gridstack Layout Core
//!
//! Arranges probed items on a rows x cols canvas:
//! - **Cell Policy:** Resolve the shared cell size for `contain`/`cover`
//! - **Planner:** Compute canvas size and every item's top-left offset
//! - **Shape:** Infer rows or columns left unspecified
//!
//! This crate is pure computation: no I/O, no process spawning.
//! All inputs are data; all outputs are data.

pub mod cell_policy;
pub mod planner;
pub mod shape;

pub use cell_policy::{resolve_cell_policy, CellPolicy};
pub use planner::plan_layout;
pub use shape::auto_shape;
