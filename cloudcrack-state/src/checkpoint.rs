//! Checkpoint - flat record of which provisioned resources exist

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from resource output fields to provider-assigned identifiers.
///
/// Serializes as a flat JSON object of string keys to string values.
/// Presence of all of a resource's output fields implies (best effort,
/// without reconciliation against the live provider) that the cloud
/// resource exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkpoint {
    entries: BTreeMap<String, String>,
}

impl Checkpoint {
    /// Create a new empty checkpoint
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a recorded value by field name
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries.get(field).map(String::as_str)
    }

    /// Record a value for a field, replacing any previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(field.into(), value.into());
    }

    /// Remove a field, returning its previous value if present
    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.entries.remove(field)
    }

    /// True if every listed field is present with a non-empty value
    pub fn contains_all(&self, fields: &[&str]) -> bool {
        fields
            .iter()
            .all(|f| self.entries.get(*f).is_some_and(|v| !v.is_empty()))
    }

    /// True if any of the listed fields is present
    pub fn contains_any(&self, fields: &[&str]) -> bool {
        fields.iter().any(|f| self.entries.contains_key(*f))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Merge a set of output fields into the checkpoint
    pub fn merge(&mut self, outputs: BTreeMap<String, String>) {
        self.entries.extend(outputs);
    }

    /// Iterate over all recorded fields in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
