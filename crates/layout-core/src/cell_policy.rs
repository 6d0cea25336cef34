//! Cell size resolution.
//!
//! `contain` and `cover` place every item in one shared cell size. Each
//! dimension comes from the explicit setting when present, otherwise from
//! the first item's native size. `tight` has no shared cell.

use gridstack_common::error::{GridstackError, GridstackResult};
use gridstack_grid_model::{GridSpec, Item, Size, MIN_CELL_SIZE};

/// Sizing rule applied to every item in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellPolicy {
    /// Items keep their native size.
    Native,
    /// Items are fitted into a shared cell.
    Shared(Size),
}

impl CellPolicy {
    pub(crate) fn cell(&self) -> Option<Size> {
        match self {
            Self::Native => None,
            Self::Shared(size) => Some(*size),
        }
    }
}

/// Resolve the cell policy for `spec` given the ordered items.
pub fn resolve_cell_policy(spec: &GridSpec, items: &[Item]) -> GridstackResult<CellPolicy> {
    if !spec.fit_mode.uses_cells() {
        if spec.cell_width.is_some() || spec.cell_height.is_some() {
            tracing::debug!(
                cell_width = ?spec.cell_width,
                cell_height = ?spec.cell_height,
                "Ignoring explicit cell size in tight mode"
            );
        }
        return Ok(CellPolicy::Native);
    }

    let first = items.first();
    let width = match (spec.cell_width, first) {
        (Some(w), _) => w,
        (None, Some(item)) => item.width,
        (None, None) => {
            return Err(GridstackError::empty_input(
                "no items to derive the cell width from",
            ))
        }
    };
    let height = match (spec.cell_height, first) {
        (Some(h), _) => h,
        (None, Some(item)) => item.height,
        (None, None) => {
            return Err(GridstackError::empty_input(
                "no items to derive the cell height from",
            ))
        }
    };

    let cell = Size::new(width, height);
    if !cell.at_least(MIN_CELL_SIZE) {
        return Err(GridstackError::invalid_config(format!(
            "cell size {cell} is below the {MIN_CELL_SIZE}px minimum"
        )));
    }

    tracing::debug!(
        fit_mode = %spec.fit_mode,
        cell = %cell,
        explicit_width = spec.cell_width.is_some(),
        explicit_height = spec.cell_height.is_some(),
        "Resolved cell size"
    );
    Ok(CellPolicy::Shared(cell))
}
