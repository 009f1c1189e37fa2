use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Count of issues per category label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    counts: BTreeMap<String, u64>,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `label`
    pub fn increment(&mut self, label: &str) {
        *self.counts.entry(label.to_string()).or_insert(0) += 1;
    }

    /// Add the counts of a disjoint partial distribution
    pub fn merge(&mut self, other: &Distribution) {
        for (label, count) in &other.counts {
            *self.counts.entry(label.clone()).or_insert(0) += count;
        }
    }

    /// Count for `label`, zero when never seen
    pub fn get(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Render as `label=count;label=count`, labels sorted
    pub fn data(&self) -> String {
        self.iter()
            .map(|(label, count)| format!("{}={}", label, count))
            .collect::<Vec<_>>()
            .join(";")
    }
}
