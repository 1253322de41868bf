//! Command handlers behind the CLI.
//!
//! Each handler takes a [`Context`] carrying the configuration, the state
//! store and the clock, so nothing reads ambient state.

mod clear;
mod init;
mod publish;
mod rebuild;
mod reset;
mod status;
mod update;

pub use clear::clear;
pub use init::{init, InitReport};
pub use publish::publish;
pub use rebuild::rebuild;
pub use reset::reset;
pub use status::{status, StatusReport};
pub use update::{update, UpdateReport};

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use dutycal_core::feed::rebuild_feed;
use dutycal_core::models::{Components, History, Roster};
use dutycal_core::DutyStore;

use crate::config::Config;
use crate::error::CliResult;
use crate::remote::relative_path;

pub struct Context {
    pub config: Config,
    pub store: DutyStore,
    /// Local calendar day used for week arithmetic.
    pub today: NaiveDate,
    /// Generation timestamp stamped into the feed.
    pub now: DateTime<Utc>,
}

impl Context {
    pub fn new(config: Config, store: DutyStore, today: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            config,
            store,
            today,
            now,
        }
    }

    pub fn roster(&self) -> Roster {
        self.config.roster()
    }

    pub fn components(&self) -> Components {
        self.config.components()
    }

    fn rebuild_feed(&self, history: &History) -> CliResult<()> {
        rebuild_feed(
            &self.store,
            history,
            &self.components(),
            &self.config.calendar,
            self.now,
        )?;
        Ok(())
    }

    /// Every artifact that gets published, relative to the state root.
    fn artifacts(&self) -> CliResult<Vec<(String, PathBuf)>> {
        let root = self.store.root();
        let mut files = vec![self.store.history_path()];
        files.extend(self.store.calendar_files()?);
        files.push(self.store.feed_path());

        Ok(files
            .into_iter()
            .map(|path| (relative_path(root, &path), path))
            .collect())
    }
}
