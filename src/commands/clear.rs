use dutycal_core::prune::{prune_after, PruneReport};
use dutycal_core::rotation::week_start;

use super::Context;
use crate::error::CliResult;

/// Drops every cycle after the current week, keeping the week in progress.
pub fn clear(ctx: &Context) -> CliResult<PruneReport> {
    let cutoff = week_start(ctx.today);
    let report = prune_after(
        &ctx.store,
        cutoff,
        &ctx.components(),
        &ctx.config.calendar,
        ctx.now,
    )?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::context;
    use crate::commands::update;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn keeps_the_current_week() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        update(&ctx, 4, &mut StdRng::seed_from_u64(1)).unwrap();

        let report = clear(&ctx).unwrap();

        assert_eq!(report.cycles_removed.len(), 3);
        let history = ctx.store.load_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().start_date, week_start(ctx.today));

        let feed = ctx.store.read_feed().unwrap().unwrap();
        assert_eq!(feed.matches("BEGIN:VEVENT").count(), 1);

        assert!(clear(&ctx).unwrap().is_noop());
    }
}
