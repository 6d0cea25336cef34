//! Print the layout without rendering.

use gridstack_grid_model::{CanvasPlan, GridSpec};
use gridstack_render_engine::{build_program, ChainProber, CompositeProgram};
use serde::Serialize;

use crate::args::LayoutSettings;
use crate::commands::prepare;

#[derive(Serialize)]
struct PlanReport<'a> {
    grid: &'a GridSpec,
    plan: &'a CanvasPlan,
    program: &'a CompositeProgram,
}

pub fn run(settings: LayoutSettings) -> anyhow::Result<()> {
    let prepared = prepare(&settings, &ChainProber::system_default())?;
    let program = build_program(&prepared.plan, &settings.background)?;

    let report = PlanReport {
        grid: &prepared.spec,
        plan: &prepared.plan,
        program: &program,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
