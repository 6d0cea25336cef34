//! Grid layout planning.
//!
//! Items are placed in row-major order: index `i` lands on row
//! `i / cols`, column `i % cols`. Items past `rows * cols` are dropped.
//!
//! - `contain`/`cover`: a uniform grid of cells separated by the gutter.
//!   The canvas always spans every row and column, even when under-filled.
//! - `tight`: each row is packed with native-size items, the widest row
//!   sets the canvas width and narrower rows are aligned inside it. Items
//!   sit on their row's top edge; shorter items are not centered vertically.
//!   Gutters separate every declared row, so unfilled trailing rows still
//!   add their gutters to the canvas height.

use gridstack_common::error::{GridstackError, GridstackResult};
use gridstack_grid_model::{CanvasPlan, GridSpec, Item, PlacedItem, Size};

use crate::cell_policy::{resolve_cell_policy, CellPolicy};

/// Validate `spec`, resolve the cell policy, and lay out `items`.
pub fn plan_layout(spec: &GridSpec, items: &[Item]) -> GridstackResult<CanvasPlan> {
    spec.validate()?;
    let kept = &items[..items.len().min(spec.capacity())];
    let policy = resolve_cell_policy(spec, kept)?;
    plan_with_policy(spec, items, policy)
}

/// Lay out `items` with an already resolved cell policy.
pub(crate) fn plan_with_policy(
    spec: &GridSpec,
    items: &[Item],
    policy: CellPolicy,
) -> GridstackResult<CanvasPlan> {
    spec.validate()?;
    if items.is_empty() {
        return Err(GridstackError::empty_input("no items to lay out"));
    }

    let capacity = spec.capacity();
    let dropped = items.len().saturating_sub(capacity);
    if dropped > 0 {
        tracing::debug!(
            capacity,
            total = items.len(),
            dropped,
            "Dropping items beyond grid capacity"
        );
    }
    let items = &items[..items.len().min(capacity)];

    let plan = match policy.cell() {
        Some(cell) => plan_cells(spec, items, cell, dropped)?,
        None => plan_tight(spec, items, dropped)?,
    };

    tracing::debug!(
        fit_mode = %spec.fit_mode,
        rows = spec.rows,
        cols = spec.cols,
        gutter = spec.gutter,
        canvas_width = plan.width,
        canvas_height = plan.height,
        items = plan.items.len(),
        "Canvas planned"
    );
    Ok(plan)
}

fn plan_cells(
    spec: &GridSpec,
    items: &[Item],
    cell: Size,
    dropped: usize,
) -> GridstackResult<CanvasPlan> {
    let gutter = u64::from(spec.gutter);
    let width = span(spec.cols, cell.width, gutter)?;
    let height = span(spec.rows, cell.height, gutter)?;

    let step_x = cell.width.saturating_add(spec.gutter);
    let step_y = cell.height.saturating_add(spec.gutter);
    let cols = spec.cols as usize;

    let placed = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let row = (idx / cols) as u32;
            let col = (idx % cols) as u32;
            PlacedItem {
                item: item.clone(),
                row,
                col,
                x: col * step_x,
                y: row * step_y,
                render_width: cell.width,
                render_height: cell.height,
            }
        })
        .collect();

    Ok(CanvasPlan {
        width,
        height,
        fit_mode: spec.fit_mode,
        cell: Some(cell),
        items: placed,
        dropped,
    })
}

fn plan_tight(spec: &GridSpec, items: &[Item], dropped: usize) -> GridstackResult<CanvasPlan> {
    let gutter = u64::from(spec.gutter);
    let rows: Vec<&[Item]> = items.chunks(spec.cols as usize).collect();

    let mut row_widths = Vec::with_capacity(rows.len());
    let mut row_heights = Vec::with_capacity(rows.len());
    for row in &rows {
        let widths: u64 = row.iter().map(|item| u64::from(item.width)).sum();
        let gaps = gutter * (row.len() as u64 - 1);
        row_widths.push(to_px(widths + gaps, "row width")?);
        row_heights.push(row.iter().map(|item| item.height).max().unwrap_or(0));
    }

    let width = row_widths.iter().copied().max().unwrap_or(0);
    // Unfilled rows have zero height but still count toward the gutters.
    let heights: u64 = row_heights.iter().map(|&h| u64::from(h)).sum();
    let height = to_px(
        heights + gutter * (u64::from(spec.rows) - 1),
        "canvas height",
    )?;

    let mut placed = Vec::with_capacity(items.len());
    let mut y = 0u32;
    for (r, row) in rows.iter().enumerate() {
        let mut x = spec.align.row_start(width, row_widths[r]);
        for (c, item) in row.iter().enumerate() {
            placed.push(PlacedItem {
                item: item.clone(),
                row: r as u32,
                col: c as u32,
                x,
                y,
                render_width: item.width,
                render_height: item.height,
            });
            x = x.saturating_add(item.width).saturating_add(spec.gutter);
        }
        y = y.saturating_add(row_heights[r]).saturating_add(spec.gutter);
    }

    Ok(CanvasPlan {
        width,
        height,
        fit_mode: spec.fit_mode,
        cell: None,
        items: placed,
        dropped,
    })
}

/// `count * size + gutter * (count - 1)`, checked against `u32`.
fn span(count: u32, size: u32, gutter: u64) -> GridstackResult<u32> {
    let count = u64::from(count);
    to_px(count * u64::from(size) + gutter * (count - 1), "canvas size")
}

fn to_px(value: u64, what: &str) -> GridstackResult<u32> {
    u32::try_from(value).map_err(|_| {
        GridstackError::invalid_config(format!("{what} of {value}px exceeds the supported range"))
    })
}
