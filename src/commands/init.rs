use std::path::Path;

use dutycal_core::models::{Component, ComponentCalendar, Components, History};
use dutycal_core::store::atomic;
use dutycal_core::DutyError;
use serde::de::DeserializeOwned;

use super::Context;
use crate::error::{CliError, CliResult};
use crate::remote::{relative_path, Remote};

#[derive(Debug, Clone, Default)]
pub struct InitReport {
    /// Relative paths copied from the remote.
    pub fetched: Vec<String>,
    /// Relative paths that could not be fetched or parsed.
    pub skipped: Vec<String>,
}

/// Seeds local state from the published copy at `remote.url`.
///
/// Refuses to run when a local history already exists. Each file is fetched
/// on its own; one that fails to download or parse is logged and skipped.
/// A skipped calendar is rebuilt from the fetched history, or left as an empty
/// skeleton when the history names someone no longer on the roster.
pub async fn init(ctx: &Context) -> CliResult<InitReport> {
    if ctx.store.has_state() {
        return Err(CliError::StateExists {
            path: ctx.store.history_path(),
        });
    }
    let location = ctx
        .config
        .remote
        .url
        .as_deref()
        .ok_or(CliError::RemoteNotConfigured { setting: "url" })?;
    let remote = Remote::from_location(location, ctx.config.remote.token());

    let components = ctx.components();
    ctx.store.check_calendar_paths(&components)?;

    let root = ctx.store.root();
    let mut report = InitReport::default();

    let history_path = ctx.store.history_path();
    let relative = relative_path(root, &history_path);
    match fetch_json::<History>(&remote, &relative, &history_path).await {
        Ok(()) => report.fetched.push(relative),
        Err(e) => skip(&mut report, relative, e),
    }

    let mut missing: Vec<Component> = Vec::new();
    for component in components.iter() {
        let path = ctx.store.calendar_path(component);
        let relative = relative_path(root, &path);
        match fetch_json::<ComponentCalendar>(&remote, &relative, &path).await {
            Ok(()) => report.fetched.push(relative),
            Err(e) => {
                skip(&mut report, relative, e);
                missing.push(component.clone());
            }
        }
    }

    ctx.store.init_layout(&components)?;
    let history = ctx.store.load_history()?;
    if !missing.is_empty() && !history.is_empty() {
        restore_calendars(ctx, &history, Components::new(missing))?;
    }
    ctx.rebuild_feed(&history)?;

    tracing::info!(
        fetched = report.fetched.len(),
        skipped = report.skipped.len(),
        cycles = history.len(),
        "Initialized duty state"
    );
    Ok(report)
}

fn restore_calendars(ctx: &Context, history: &History, missing: Components) -> CliResult<()> {
    match ctx
        .store
        .rebuild_calendars(history, &ctx.roster(), &missing)
    {
        Ok(report) => {
            tracing::info!(
                calendars = report.calendars_written,
                "Rebuilt skipped calendars from history"
            );
            Ok(())
        }
        Err(DutyError::FatalState(reason)) => {
            tracing::warn!(
                components = ?missing.names(),
                reason = %reason,
                "Leaving skipped calendars empty"
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn skip(report: &mut InitReport, relative: String, error: CliError) {
    tracing::warn!(file = %relative, error = %error, "Skipping remote file");
    report.skipped.push(relative);
}

/// Downloads one file and stores it only if it parses as `T`.
async fn fetch_json<T: DeserializeOwned>(
    remote: &Remote,
    relative: &str,
    local: &Path,
) -> CliResult<()> {
    let body = remote.fetch(relative).await?;
    serde_json::from_slice::<T>(&body)
        .map_err(|e| CliError::external(remote.describe(relative), e))?;
    atomic::write_atomic(local, &body)?;
    Ok(())
}
