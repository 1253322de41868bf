use dutycal_core::models::DutyCycle;
use dutycal_core::rotation::next_cycle;
use dutycal_core::Inconsistency;
use rand::Rng;

use super::Context;
use crate::error::CliResult;

#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    pub cycles: Vec<DutyCycle>,
    pub inconsistencies: Vec<Inconsistency>,
}

/// Appends `count` cycles, each following the one before it.
///
/// Every cycle is committed (history plus component calendars) before the
/// next is computed; the feed is rebuilt once at the end.
pub fn update<R>(ctx: &Context, count: usize, rng: &mut R) -> CliResult<UpdateReport>
where
    R: Rng + ?Sized,
{
    let roster = ctx.roster();
    let components = ctx.components();
    let mut history = ctx.store.load_history()?;
    let mut report = UpdateReport::default();

    for _ in 0..count {
        let rotation = next_cycle(&history, &roster, &components, ctx.today, rng)?;
        let cycle = rotation.cycle;

        history.insert(cycle.clone());
        ctx.store
            .commit_cycle(&history, &cycle, &roster, &components)?;

        tracing::info!(
            start_date = %cycle.start_date,
            first = %cycle.assignment.first.triager,
            second = %cycle.assignment.second.triager,
            "Added duty cycle"
        );
        report.cycles.push(cycle);
        report.inconsistencies.extend(rotation.inconsistencies);
    }

    ctx.rebuild_feed(&history)?;
    Ok(report)
}
