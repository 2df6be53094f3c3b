//! Worker directory data model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A registered worker as listed in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerProfile {
    /// Opaque unique identifier.
    pub id: String,
    pub name: String,
    pub gender: String,
    /// Trade, e.g. "Plumber". Matched by search and the work-type filter.
    pub work_type: String,
    pub institute: String,
    pub contact: String,
    /// Area of the city, matched by the location filter.
    pub location: String,
}

impl WorkerProfile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        work_type: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            gender: String::new(),
            work_type: work_type.into(),
            institute: String::new(),
            contact: String::new(),
            location: location.into(),
        }
    }

    /// Builder: set gender.
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = gender.into();
        self
    }

    /// Builder: set training institute.
    pub fn with_institute(mut self, institute: impl Into<String>) -> Self {
        self.institute = institute.into();
        self
    }

    /// Builder: set contact number.
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }
}

/// Ordered, id-unique set of workers fetched for one directory view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    profiles: Vec<WorkerProfile>,
}

impl DirectorySnapshot {
    /// Build a snapshot, keeping the first profile for any repeated id.
    pub fn new(profiles: Vec<WorkerProfile>) -> Self {
        let mut seen = HashSet::with_capacity(profiles.len());
        let mut unique = Vec::with_capacity(profiles.len());
        for profile in profiles {
            if seen.insert(profile.id.clone()) {
                unique.push(profile);
            } else {
                warn!(worker_id = %profile.id, "Dropping duplicate worker id from snapshot");
            }
        }
        Self { profiles: unique }
    }

    pub fn profiles(&self) -> &[WorkerProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&WorkerProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }
}

impl From<Vec<WorkerProfile>> for DirectorySnapshot {
    fn from(profiles: Vec<WorkerProfile>) -> Self {
        Self::new(profiles)
    }
}

/// Search and filter inputs. Blank fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub search_text: String,
    pub work_type: String,
    pub location: String,
}

impl FilterCriteria {
    /// Whether every field is blank.
    pub fn is_unconstrained(&self) -> bool {
        self.search_text.trim().is_empty()
            && self.work_type.trim().is_empty()
            && self.location.trim().is_empty()
    }

    /// Whether `profile` passes all three predicates.
    pub fn matches(&self, profile: &WorkerProfile) -> bool {
        contains_ignore_case(&profile.work_type, &self.search_text)
            && contains_ignore_case(&profile.work_type, &self.work_type)
            && contains_ignore_case(&profile.location, &self.location)
    }
}

/// Case-insensitive substring test where a blank needle always matches.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.trim().is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
