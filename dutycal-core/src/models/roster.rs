use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A person eligible for triage duty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triager {
    pub name: String,
    /// Opaque metadata (contact details etc.), copied verbatim into calendars.
    #[serde(default)]
    pub metadata: Value,
}

impl Triager {
    pub fn new(name: impl Into<String>, metadata: Value) -> Self {
        Self {
            name: name.into(),
            metadata,
        }
    }
}

/// Ordered list of triagers. Order drives the round-robin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    triagers: Vec<Triager>,
}

impl Roster {
    /// Builds a roster, keeping the first entry for any repeated name.
    pub fn new(triagers: Vec<Triager>) -> Self {
        let mut unique: Vec<Triager> = Vec::with_capacity(triagers.len());
        for triager in triagers {
            if !unique.iter().any(|t| t.name == triager.name) {
                unique.push(triager);
            }
        }
        Self { triagers: unique }
    }

    /// Roster of bare names with null metadata.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|n| Triager::new(n, Value::Null))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.triagers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triagers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Triager> {
        self.triagers.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.triagers.iter().position(|t| t.name == name)
    }

    pub fn find(&self, name: &str) -> Option<&Triager> {
        self.triagers.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triager> {
        self.triagers.iter()
    }
}

/// A unit of work handed to exactly one of the two triagers each cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub metadata: Value,
}

impl Component {
    pub fn new(name: impl Into<String>, metadata: Value) -> Self {
        Self {
            name: name.into(),
            metadata,
        }
    }

    /// File-system safe form of the name, used for the per-component calendar file.
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// The closed, configuration-ordered set of components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Components {
    components: Vec<Component>,
}

impl Components {
    pub fn new(components: Vec<Component>) -> Self {
        let mut unique: Vec<Component> = Vec::with_capacity(components.len());
        for component in components {
            if !unique.iter().any(|c| c.name == component.name) {
                unique.push(component);
            }
        }
        Self { components: unique }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|n| Component::new(n, Value::Null))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.components.iter().map(|c| c.name.clone()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    /// First two components whose names map to the same calendar file.
    pub fn slug_collision(&self) -> Option<(&Component, &Component)> {
        let mut seen: HashMap<String, &Component> = HashMap::new();
        for component in &self.components {
            if let Some(earlier) = seen.insert(component.slug(), component) {
                return Some((earlier, component));
            }
        }
        None
    }
}

/// Lowercases and replaces every run of non-alphanumeric characters with `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push('_');
    }
    slug
}
