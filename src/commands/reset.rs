use dutycal_core::models::History;

use super::Context;
use crate::error::CliResult;

/// Wipes history and every component calendar back to empty skeletons.
pub fn reset(ctx: &Context) -> CliResult<()> {
    ctx.store.reset(&ctx.components())?;
    ctx.rebuild_feed(&History::new())?;
    Ok(())
}
