//! The in-memory trusted set and its follower intersection.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

/// A snapshot of the trusted-accounts set.
///
/// Handles are normalized (lower-case, no leading `@`) and kept in
/// source-list order; `refreshed_at` is the stamp of the last successful
/// refresh, or `None` when the set has never been populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedSet {
    handles: Vec<String>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl TrustedSet {
    #[must_use]
    pub fn new(handles: Vec<String>, refreshed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            handles,
            refreshed_at,
        }
    }

    #[must_use]
    pub fn handles(&self) -> &[String] {
        &self.handles
    }

    #[must_use]
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Count the trusted handles present in `followers`, case-insensitively.
    ///
    /// Returns the count and the matching handles in this set's iteration
    /// order. Duplicates in either input never double-count, and neither
    /// input is mutated. An empty set or empty sample yields `(0, vec![])`.
    #[must_use]
    pub fn intersect(&self, followers: &[String]) -> (usize, Vec<String>) {
        if self.handles.is_empty() || followers.is_empty() {
            return (0, vec![]);
        }

        let follower_set: HashSet<String> =
            followers.iter().map(|f| f.to_lowercase()).collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut matched = Vec::new();
        for handle in &self.handles {
            if seen.insert(handle.as_str()) && follower_set.contains(&handle.to_lowercase()) {
                matched.push(handle.clone());
            }
        }

        (matched.len(), matched)
    }
}
