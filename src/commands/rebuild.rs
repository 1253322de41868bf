use dutycal_core::store::ProjectionReport;

use super::Context;
use crate::error::CliResult;

/// Regenerates every component calendar and the feed from the history alone.
pub fn rebuild(ctx: &Context) -> CliResult<ProjectionReport> {
    let history = ctx.store.load_history()?;
    let report = ctx
        .store
        .rebuild_calendars(&history, &ctx.roster(), &ctx.components())?;
    ctx.rebuild_feed(&history)?;
    Ok(report)
}
