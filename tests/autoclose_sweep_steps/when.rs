//! When steps for autoclose sweep BDD scenarios.

use super::world::{AutocloseWorld, run_async};
use crate::clock_helpers::instant;
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"the sweep runs at "{now}""#)]
fn sweep_runs_at(world: &mut AutocloseWorld, now: String) -> Result<(), eyre::Report> {
    let at = instant(&now)?;
    let report = run_async(world.autoclose.run_sweep(at)).wrap_err("run scenario sweep")?;
    world.last_report = Some(report);
    Ok(())
}
