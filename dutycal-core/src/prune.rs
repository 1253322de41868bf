//! Rolling back cycles dated after a cutoff.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::DutyResult;
use crate::feed::{rebuild_feed, FeedSettings};
use crate::models::Components;
use crate::store::{DutyStore, StagedWrites};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub cycles_removed: Vec<NaiveDate>,
    pub calendar_entries_removed: usize,
}

impl PruneReport {
    pub fn is_noop(&self) -> bool {
        self.cycles_removed.is_empty() && self.calendar_entries_removed == 0
    }
}

/// Removes every history cycle and calendar assignment dated after `cutoff`.
///
/// Entries on the cutoff itself stay. Every calendar file on disk is pruned,
/// including ones for components no longer configured. When nothing is
/// removed no file is touched; otherwise the feed is rebuilt afterwards.
pub fn prune_after(
    store: &DutyStore,
    cutoff: NaiveDate,
    components: &Components,
    settings: &FeedSettings,
    generated_at: DateTime<Utc>,
) -> DutyResult<PruneReport> {
    let mut history = store.load_history()?;
    let mut calendars = store.load_all_calendars()?;

    let mut report = PruneReport {
        cycles_removed: history.prune_after(cutoff),
        calendar_entries_removed: 0,
    };

    let mut staged = StagedWrites::new();
    for (path, calendar) in calendars.iter_mut() {
        let removed = calendar.prune_after(cutoff);
        if removed > 0 {
            report.calendar_entries_removed += removed;
            staged.stage_json(path.clone(), calendar)?;
        }
    }

    if report.is_noop() {
        tracing::info!(cutoff = %cutoff, "Nothing dated after cutoff");
        return Ok(report);
    }

    staged.stage_json(store.history_path(), &history)?;
    staged.commit()?;
    rebuild_feed(store, &history, components, settings, generated_at)?;

    tracing::info!(
        cutoff = %cutoff,
        cycles = report.cycles_removed.len(),
        calendar_entries = report.calendar_entries_removed,
        "Pruned future cycles"
    );
    Ok(report)
}
