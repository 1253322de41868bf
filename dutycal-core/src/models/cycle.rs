use std::collections::HashSet;
use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Components;

/// Length of one duty cycle in days.
pub const CYCLE_LENGTH_DAYS: i64 = 7;

/// One triager's half of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub triager: String,
    pub components: Vec<String>,
}

impl Shift {
    pub fn new(triager: impl Into<String>, components: Vec<String>) -> Self {
        Self {
            triager: triager.into(),
            components,
        }
    }

    pub fn covers(&self, component: &str) -> bool {
        self.components.iter().any(|c| c == component)
    }
}

/// The ordered pair of shifts for one cycle.
///
/// On disk this is a two-entry JSON object; entry order is significant, since
/// the second triager decides where the rotation resumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub first: Shift,
    pub second: Shift,
}

impl Assignment {
    pub fn new(first: Shift, second: Shift) -> Self {
        Self { first, second }
    }

    pub fn shifts(&self) -> [&Shift; 2] {
        [&self.first, &self.second]
    }

    /// The shift holding `component`, if any.
    pub fn owner_of(&self, component: &str) -> Option<&Shift> {
        self.shifts().into_iter().find(|s| s.covers(component))
    }

    /// True when the two component lists are disjoint and together equal `components`.
    pub fn is_partition_of(&self, components: &Components) -> bool {
        let first: HashSet<&str> = self.first.components.iter().map(String::as_str).collect();
        let second: HashSet<&str> = self.second.components.iter().map(String::as_str).collect();

        if first.len() != self.first.components.len() || second.len() != self.second.components.len()
        {
            return false;
        }
        if !first.is_disjoint(&second) {
            return false;
        }

        let union: HashSet<&str> = first.union(&second).copied().collect();
        let expected: HashSet<&str> = components.iter().map(|c| c.name.as_str()).collect();
        union == expected
    }
}

impl Serialize for Assignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&self.first.triager, &self.first.components)?;
        map.serialize_entry(&self.second.triager, &self.second.components)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Assignment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AssignmentVisitor;

        impl<'de> Visitor<'de> for AssignmentVisitor {
            type Value = Assignment;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object with exactly two triagers mapped to component lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Assignment, A::Error> {
                let mut shifts: Vec<Shift> = Vec::with_capacity(2);
                while let Some((name, components)) = access.next_entry::<String, Vec<String>>()? {
                    if shifts.iter().any(|s| s.triager == name) {
                        return Err(de::Error::custom(format!("triager {} listed twice", name)));
                    }
                    shifts.push(Shift::new(name, components));
                }

                if shifts.len() != 2 {
                    return Err(de::Error::invalid_length(shifts.len(), &self));
                }
                let second = shifts.pop();
                let first = shifts.pop();
                match (first, second) {
                    (Some(first), Some(second)) => Ok(Assignment::new(first, second)),
                    _ => Err(de::Error::invalid_length(0, &self)),
                }
            }
        }

        deserializer.deserialize_map(AssignmentVisitor)
    }
}

/// A dated assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyCycle {
    pub start_date: NaiveDate,
    pub assignment: Assignment,
}

impl DutyCycle {
    pub fn new(start_date: NaiveDate, assignment: Assignment) -> Self {
        Self {
            start_date,
            assignment,
        }
    }

    /// Exclusive end of the cycle.
    pub fn end_date(&self) -> NaiveDate {
        cycle_end(self.start_date)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start_date && day < self.end_date()
    }
}

pub fn cycle_end(start_date: NaiveDate) -> NaiveDate {
    start_date + Duration::days(CYCLE_LENGTH_DAYS)
}
