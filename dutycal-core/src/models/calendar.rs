use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-component projection of the history.
///
/// Both keys are required when reading; a file missing either is corrupt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentCalendar {
    /// Everyone who has ever held this component, with the metadata seen first.
    pub triagers: Map<String, Value>,
    /// Start date of each cycle mapped to whoever held the component.
    #[serde(rename = "duty-start-dates")]
    pub assignments: BTreeMap<NaiveDate, String>,
}

impl ComponentCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` as the holder for `start_date`.
    ///
    /// Metadata is only stored the first time a name appears.
    pub fn upsert(&mut self, start_date: NaiveDate, name: &str, metadata: &Value) {
        if !self.triagers.contains_key(name) {
            self.triagers.insert(name.to_string(), metadata.clone());
        }
        self.assignments.insert(start_date, name.to_string());
    }

    pub fn holder(&self, start_date: NaiveDate) -> Option<&str> {
        self.assignments.get(&start_date).map(String::as_str)
    }

    /// Drops assignments dated strictly after `cutoff`; returns how many were dropped.
    pub fn prune_after(&mut self, cutoff: NaiveDate) -> usize {
        let before = self.assignments.len();
        self.assignments.retain(|date, _| *date <= cutoff);
        before - self.assignments.len()
    }
}
