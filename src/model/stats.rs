use crate::model::EventType;
use serde::{Deserialize, Serialize};

/// The total for one event type in a month, with its per-category breakdown.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub sum: String,
    #[serde(default)]
    pub categories: Vec<CategorySum>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategorySum {
    pub category: String,
    pub sum: String,
}

/// Orders statistics for display: types descending by name, categories ascending by name.
pub fn sort_stats(stats: &mut [Stats]) {
    stats.sort_by(|a, b| b.kind.as_str().cmp(a.kind.as_str()));
    for s in stats.iter_mut() {
        s.categories.sort_by(|a, b| a.category.cmp(&b.category));
    }
}
