use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde_json::Value;

use super::{atomic, DutyStore, StagedWrites};
use crate::error::{DutyError, DutyResult};
use crate::models::{Component, ComponentCalendar, Components, DutyCycle, History, Roster};

/// What a projection touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionReport {
    pub calendars_written: usize,
    pub skipped_components: Vec<String>,
}

fn resolve_metadata<'r>(roster: &'r Roster, name: &str) -> DutyResult<&'r Value> {
    roster
        .find(name)
        .map(|t| &t.metadata)
        .ok_or_else(|| DutyError::fatal(format!("triager {} is not in the configuration", name)))
}

impl DutyStore {
    fn load_or_skeleton(&self, component: &Component) -> DutyResult<ComponentCalendar> {
        Ok(self.load_calendar(component)?.unwrap_or_default())
    }

    /// Records one holder for one component and cycle, creating the calendar if needed.
    pub fn upsert(
        &self,
        component: &Component,
        start_date: NaiveDate,
        name: &str,
        metadata: &Value,
    ) -> DutyResult<()> {
        let mut calendar = self.load_or_skeleton(component)?;
        calendar.upsert(start_date, name, metadata);
        atomic::write_json(&self.calendar_path(component), &calendar)
    }

    /// Writes `history` and projects `cycle` into every component calendar.
    ///
    /// All calendars are read and validated before anything is written, and
    /// the writes are committed as one batch. Components missing from the
    /// cycle's assignment are reported rather than written.
    pub fn commit_cycle(
        &self,
        history: &History,
        cycle: &DutyCycle,
        roster: &Roster,
        components: &Components,
    ) -> DutyResult<ProjectionReport> {
        self.check_calendar_paths(components)?;
        let mut report = ProjectionReport::default();
        let mut calendars: Vec<(PathBuf, ComponentCalendar)> = Vec::new();

        for component in components.iter() {
            let Some(shift) = cycle.assignment.owner_of(&component.name) else {
                report.skipped_components.push(component.name.clone());
                continue;
            };
            let metadata = resolve_metadata(roster, &shift.triager)?;

            let mut calendar = self.load_or_skeleton(component)?;
            calendar.upsert(cycle.start_date, &shift.triager, metadata);
            calendars.push((self.calendar_path(component), calendar));
        }

        let mut staged = StagedWrites::new();
        staged.stage_json(self.history_path(), history)?;
        for (path, calendar) in &calendars {
            staged.stage_json(path.clone(), calendar)?;
        }
        staged.commit()?;

        report.calendars_written = calendars.len();
        if !report.skipped_components.is_empty() {
            tracing::warn!(
                start_date = %cycle.start_date,
                skipped = ?report.skipped_components,
                "Components absent from the cycle were not projected"
            );
        }
        Ok(report)
    }

    /// Regenerates every configured component calendar from `history`.
    ///
    /// Triager metadata comes from the current roster, so every name in the
    /// history must still be configured.
    pub fn rebuild_calendars(
        &self,
        history: &History,
        roster: &Roster,
        components: &Components,
    ) -> DutyResult<ProjectionReport> {
        self.check_calendar_paths(components)?;
        let mut calendars: BTreeMap<String, ComponentCalendar> = components
            .iter()
            .map(|c| (c.name.clone(), ComponentCalendar::new()))
            .collect();

        for cycle in history.cycles() {
            for shift in cycle.assignment.shifts() {
                let metadata = resolve_metadata(roster, &shift.triager)?;
                for name in &shift.components {
                    if let Some(calendar) = calendars.get_mut(name) {
                        calendar.upsert(cycle.start_date, &shift.triager, metadata);
                    }
                }
            }
        }

        let mut staged = StagedWrites::new();
        for component in components.iter() {
            if let Some(calendar) = calendars.get(&component.name) {
                staged.stage_json(self.calendar_path(component), calendar)?;
            }
        }
        let written = staged.len();
        staged.commit()?;

        tracing::info!(calendars = written, cycles = history.len(), "Rebuilt component calendars");
        Ok(ProjectionReport {
            calendars_written: written,
            skipped_components: Vec::new(),
        })
    }

    /// Loads every calendar file on disk, keyed by path.
    pub fn load_all_calendars(&self) -> DutyResult<Vec<(PathBuf, ComponentCalendar)>> {
        let mut calendars = Vec::new();
        for path in self.calendar_files()? {
            let calendar = atomic::read_json::<ComponentCalendar>(&path)?.unwrap_or_default();
            calendars.push((path, calendar));
        }
        Ok(calendars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Shift, Triager};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn roster() -> Roster {
        Roster::new(vec![
            Triager::new("alice", json!({"email": "alice@example.com"})),
            Triager::new("bob", json!({"email": "bob@example.com"})),
        ])
    }

    fn cycle(start: &str) -> DutyCycle {
        DutyCycle::new(
            date(start),
            Assignment::new(
                Shift::new("alice", vec!["dom".into()]),
                Shift::new("bob", vec!["css".into()]),
            ),
        )
    }

    #[test]
    fn upsert_creates_missing_calendar() {
        let dir = TempDir::new().unwrap();
        let store = DutyStore::open(dir.path());
        let dom = Component::new("dom", Value::Null);

        store
            .upsert(&dom, date("2024-01-01"), "alice", &json!({"irc": "al"}))
            .unwrap();
        store
            .upsert(&dom, date("2024-01-01"), "alice", &json!({"irc": "changed"}))
            .unwrap();

        let calendar = store.load_calendar(&dom).unwrap().unwrap();
        assert_eq!(calendar.triagers["alice"], json!({"irc": "al"}));
        assert_eq!(calendar.holder(date("2024-01-01")), Some("alice"));
    }

    #[test]
    fn upsert_rejects_calendar_without_required_keys() {
        let dir = TempDir::new().unwrap();
        let store = DutyStore::open(dir.path());
        let dom = Component::new("dom", Value::Null);
        fs::create_dir_all(store.calendars_dir()).unwrap();
        fs::write(store.calendar_path(&dom), r#"{"triagers": {}}"#).unwrap();

        let err = store
            .upsert(&dom, date("2024-01-01"), "alice", &Value::Null)
            .unwrap_err();
        assert!(matches!(err, DutyError::CorruptState { .. }));
    }

    #[test]
    fn commit_cycle_writes_history_and_each_calendar() {
        let dir = TempDir::new().unwrap();
        let store = DutyStore::open(dir.path());
        let components = Components::from_names(["dom", "css"]);
        let cycle = cycle("2024-01-01");
        let mut history = History::new();
        history.insert(cycle.clone());

        let report = store
            .commit_cycle(&history, &cycle, &roster(), &components)
            .unwrap();

        assert_eq!(report.calendars_written, 2);
        assert_eq!(store.load_history().unwrap(), history);
        let css = store
            .load_calendar(components.find("css").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(css.holder(date("2024-01-01")), Some("bob"));
        assert_eq!(css.triagers["bob"], json!({"email": "bob@example.com"}));
        assert!(!css.triagers.contains_key("alice"));
    }

    #[test]
    fn corrupt_calendar_aborts_before_any_write() {
        let dir = TempDir::new().unwrap();
        let store = DutyStore::open(dir.path());
        let components = Components::from_names(["dom", "css"]);
        store.init_layout(&components).unwrap();
        fs::write(
            store.calendar_path(components.find("css").unwrap()),
            r#"{"duty-start-dates": {}}"#,
        )
        .unwrap();

        let cycle = cycle("2024-01-01");
        let mut history = History::new();
        history.insert(cycle.clone());

        let err = store
            .commit_cycle(&history, &cycle, &roster(), &components)
            .unwrap_err();
        assert!(matches!(err, DutyError::CorruptState { .. }));

        assert!(store.load_history().unwrap().is_empty());
        let dom = store
            .load_calendar(components.find("dom").unwrap())
            .unwrap()
            .unwrap();
        assert!(dom.assignments.is_empty());
    }

    #[test]
    fn unknown_triager_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = DutyStore::open(dir.path());
        let components = Components::from_names(["dom", "css"]);
        let cycle = cycle("2024-01-01");
        let mut history = History::new();
        history.insert(cycle.clone());

        let err = store
            .commit_cycle(&history, &cycle, &Roster::from_names(["alice"]), &components)
            .unwrap_err();
        assert!(matches!(err, DutyError::FatalState(_)));
    }

    #[test]
    fn rebuild_matches_incremental_projection() {
        let dir = TempDir::new().unwrap();
        let store = DutyStore::open(dir.path());
        let components = Components::from_names(["dom", "css"]);

        let mut history = History::new();
        for start in ["2024-01-01", "2024-01-08"] {
            let cycle = cycle(start);
            history.insert(cycle.clone());
            store
                .commit_cycle(&history, &cycle, &roster(), &components)
                .unwrap();
        }
        let incremental = store.load_all_calendars().unwrap();

        store.reset(&components).unwrap();
        store
            .rebuild_calendars(&history, &roster(), &components)
            .unwrap();

        assert_eq!(store.load_all_calendars().unwrap(), incremental);
    }

    #[test]
    fn components_sharing_a_file_are_fatal() {
        let dir = TempDir::new().unwrap();
        let store = DutyStore::open(dir.path());
        let components = Components::from_names(["Web Audio", "Web-Audio"]);
        let cycle = DutyCycle::new(
            date("2024-01-01"),
            Assignment::new(
                Shift::new("alice", vec!["Web Audio".into()]),
                Shift::new("bob", vec!["Web-Audio".into()]),
            ),
        );
        let mut history = History::new();
        history.insert(cycle.clone());

        let err = store
            .commit_cycle(&history, &cycle, &roster(), &components)
            .unwrap_err();
        assert!(matches!(err, DutyError::FatalState(_)));
        assert!(!store.has_state());
        assert!(store.calendar_files().unwrap().is_empty());

        for err in [
            store.init_layout(&components).unwrap_err(),
            store.reset(&components).unwrap_err(),
            store
                .rebuild_calendars(&history, &roster(), &components)
                .unwrap_err(),
        ] {
            assert!(matches!(err, DutyError::FatalState(_)));
        }
        assert!(store.calendar_files().unwrap().is_empty());
    }
}
