//! On-disk state: the history file, one calendar file per component, and the feed.
//!
//! ```text
//! <root>/history.json
//! <root>/calendars/<component-slug>.json
//! <root>/triage.ics
//! ```

pub mod atomic;
mod calendars;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DutyError, DutyResult};
use crate::models::{Component, ComponentCalendar, Components, History};

pub use atomic::StagedWrites;
pub use calendars::ProjectionReport;

pub const HISTORY_FILE: &str = "history.json";
pub const CALENDARS_DIR: &str = "calendars";
pub const FEED_FILE: &str = "triage.ics";

#[derive(Debug, Clone)]
pub struct DutyStore {
    root: PathBuf,
}

impl DutyStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }

    pub fn calendars_dir(&self) -> PathBuf {
        self.root.join(CALENDARS_DIR)
    }

    /// Fails when two components would share one calendar file.
    pub fn check_calendar_paths(&self, components: &Components) -> DutyResult<()> {
        match components.slug_collision() {
            Some((earlier, later)) => Err(DutyError::fatal(format!(
                "components {:?} and {:?} both map to {}",
                earlier.name,
                later.name,
                self.calendar_path(later).display()
            ))),
            None => Ok(()),
        }
    }

    pub fn calendar_path(&self, component: &Component) -> PathBuf {
        self.calendars_dir().join(format!("{}.json", component.slug()))
    }

    pub fn feed_path(&self) -> PathBuf {
        self.root.join(FEED_FILE)
    }

    /// Whether a history file already exists.
    pub fn has_state(&self) -> bool {
        self.history_path().exists()
    }

    /// Creates the directory layout and empty skeletons for anything missing.
    pub fn init_layout(&self, components: &Components) -> DutyResult<()> {
        self.check_calendar_paths(components)?;
        let dir = self.calendars_dir();
        fs::create_dir_all(&dir).map_err(|e| DutyError::io(&dir, e))?;

        let mut staged = StagedWrites::new();
        if !self.history_path().exists() {
            staged.stage_json(self.history_path(), &History::new())?;
        }
        for component in components.iter() {
            let path = self.calendar_path(component);
            if !path.exists() {
                staged.stage_json(path, &ComponentCalendar::new())?;
            }
        }
        staged.commit()
    }

    /// Loads the history; a missing file is an empty history.
    pub fn load_history(&self) -> DutyResult<History> {
        let history = atomic::read_json::<History>(&self.history_path())?.unwrap_or_default();
        tracing::debug!(cycles = history.len(), "Loaded history");
        Ok(history)
    }

    pub fn save_history(&self, history: &History) -> DutyResult<()> {
        atomic::write_json(&self.history_path(), history)
    }

    pub fn load_calendar(&self, component: &Component) -> DutyResult<Option<ComponentCalendar>> {
        atomic::read_json(&self.calendar_path(component))
    }

    /// Every calendar file currently present, sorted by path.
    pub fn calendar_files(&self) -> DutyResult<Vec<PathBuf>> {
        let dir = self.calendars_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DutyError::io(&dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| DutyError::io(&dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn write_feed(&self, text: &str) -> DutyResult<()> {
        atomic::write_atomic(&self.feed_path(), text.as_bytes())
    }

    pub fn read_feed(&self) -> DutyResult<Option<String>> {
        let path = self.feed_path();
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DutyError::io(&path, e)),
        }
    }

    /// Truncates history and every calendar to empty skeletons.
    ///
    /// Calendar files for components no longer configured are removed.
    pub fn reset(&self, components: &Components) -> DutyResult<()> {
        self.check_calendar_paths(components)?;
        let keep: Vec<PathBuf> = components.iter().map(|c| self.calendar_path(c)).collect();

        let mut staged = StagedWrites::new();
        staged.stage_json(self.history_path(), &History::new())?;
        for path in &keep {
            staged.stage_json(path.clone(), &ComponentCalendar::new())?;
        }
        staged.commit()?;

        for path in self.calendar_files()? {
            if !keep.contains(&path) {
                fs::remove_file(&path).map_err(|e| DutyError::io(&path, e))?;
                tracing::debug!(path = %path.display(), "Removed stale calendar");
            }
        }
        tracing::info!(root = %self.root.display(), "Reset duty state");
        Ok(())
    }
}
