use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Assignment, DutyCycle};

/// Every recorded duty cycle, ordered by start date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(
        rename = "duty-start-dates",
        alias = "dutyCycleHistory",
        alias = "duty-cycle-history"
    )]
    cycles: BTreeMap<NaiveDate, Assignment>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Records a cycle, replacing any cycle already stored for the same date.
    pub fn insert(&mut self, cycle: DutyCycle) -> Option<Assignment> {
        self.cycles.insert(cycle.start_date, cycle.assignment)
    }

    pub fn get(&self, start_date: NaiveDate) -> Option<&Assignment> {
        self.cycles.get(&start_date)
    }

    /// The cycle with the greatest start date.
    pub fn latest(&self) -> Option<DutyCycle> {
        self.cycles
            .iter()
            .next_back()
            .map(|(date, assignment)| DutyCycle::new(*date, assignment.clone()))
    }

    /// The cycle whose seven days include `day`.
    pub fn covering(&self, day: NaiveDate) -> Option<DutyCycle> {
        self.cycles
            .range(..=day)
            .next_back()
            .map(|(date, assignment)| DutyCycle::new(*date, assignment.clone()))
            .filter(|cycle| cycle.contains(day))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&NaiveDate, &Assignment)> {
        self.cycles.iter()
    }

    pub fn cycles(&self) -> impl Iterator<Item = DutyCycle> + '_ {
        self.cycles
            .iter()
            .map(|(date, assignment)| DutyCycle::new(*date, assignment.clone()))
    }

    /// Drops every cycle dated strictly after `cutoff`; returns the dropped dates.
    pub fn prune_after(&mut self, cutoff: NaiveDate) -> Vec<NaiveDate> {
        let removed: Vec<NaiveDate> = self
            .cycles
            .range(cutoff..)
            .map(|(date, _)| *date)
            .filter(|date| *date > cutoff)
            .collect();
        for date in &removed {
            self.cycles.remove(date);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Shift;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn cycle(start: &str, first: &str, second: &str) -> DutyCycle {
        DutyCycle::new(
            date(start),
            Assignment::new(
                Shift::new(first, vec!["a".into()]),
                Shift::new(second, vec!["b".into()]),
            ),
        )
    }

    #[test]
    fn latest_is_max_date_regardless_of_insert_order() {
        let mut history = History::new();
        history.insert(cycle("2024-01-15", "c", "a"));
        history.insert(cycle("2024-01-01", "a", "b"));
        history.insert(cycle("2024-01-08", "b", "c"));

        let latest = history.latest().unwrap();
        assert_eq!(latest.start_date, date("2024-01-15"));
        assert_eq!(latest.assignment.second.triager, "a");
    }

    #[test]
    fn same_date_overwrites() {
        let mut history = History::new();
        history.insert(cycle("2024-01-01", "a", "b"));
        let previous = history.insert(cycle("2024-01-01", "c", "d"));

        assert_eq!(history.len(), 1);
        assert_eq!(previous.unwrap().first.triager, "a");
        assert_eq!(history.get(date("2024-01-01")).unwrap().first.triager, "c");
    }

    #[test]
    fn prune_keeps_cutoff_day() {
        let mut history = History::new();
        history.insert(cycle("2024-01-01", "a", "b"));
        history.insert(cycle("2024-01-08", "b", "c"));
        history.insert(cycle("2024-01-15", "c", "a"));

        let removed = history.prune_after(date("2024-01-08"));
        assert_eq!(removed, vec![date("2024-01-15")]);
        assert_eq!(history.len(), 2);
        assert!(history.prune_after(date("2024-01-08")).is_empty());
    }

    #[test]
    fn covering_finds_the_week() {
        let mut history = History::new();
        history.insert(cycle("2024-01-01", "a", "b"));

        assert!(history.covering(date("2024-01-07")).is_some());
        assert!(history.covering(date("2024-01-08")).is_none());
        assert!(history.covering(date("2023-12-31")).is_none());
    }

    #[test]
    fn reads_revision_aliases() {
        let canonical = r#"{"duty-start-dates":{"2024-01-01":{"a":["x"],"b":["y"]}}}"#;
        let camel = r#"{"dutyCycleHistory":{"2024-01-01":{"a":["x"],"b":["y"]}}}"#;

        let first: History = serde_json::from_str(canonical).unwrap();
        let second: History = serde_json::from_str(camel).unwrap();
        assert_eq!(first, second);
        assert_eq!(serde_json::to_string(&second).unwrap(), canonical);
    }
}
