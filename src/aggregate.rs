// 🏪 Store Aggregator - spending grouped by store
//
// Pure, stateless: every call rebuilds its summaries from the full item list.
// totalSpent and itemCount are always derived together from the same items.

use crate::item::{parse_date, GroceryItem};
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

// ============================================================================
// STORE SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub store: String,
    pub total_spent: f64,
    pub item_count: usize,
    /// Contributing items, in input order
    pub items: Vec<GroceryItem>,
}

impl StoreSummary {
    fn new(store: &str) -> Self {
        StoreSummary {
            store: store.to_string(),
            total_spent: 0.0,
            item_count: 0,
            items: Vec::new(),
        }
    }

    fn push(&mut self, item: &GroceryItem) {
        self.total_spent += item.price;
        self.item_count += 1;
        self.items.push(item.clone());
    }

    /// Average price per item at this store
    pub fn average_price(&self) -> f64 {
        if self.item_count == 0 {
            return 0.0;
        }
        self.total_spent / self.item_count as f64
    }
}

/// Group items by exact store name, one summary per store in first-seen order
pub fn aggregate_by_store(items: &[GroceryItem]) -> Vec<StoreSummary> {
    let mut summaries: Vec<StoreSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let slot = *index.entry(item.store.as_str()).or_insert_with(|| {
            summaries.push(StoreSummary::new(&item.store));
            summaries.len() - 1
        });
        summaries[slot].push(item);
    }

    debug!(
        "aggregated {} items into {} store summaries",
        items.len(),
        summaries.len()
    );

    summaries
}

/// Presentation order: highest spend first (stable for equal totals)
pub fn sort_by_total_spent(summaries: &mut [StoreSummary]) {
    summaries.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
}

/// Total spent across every store
pub fn grand_total(summaries: &[StoreSummary]) -> f64 {
    summaries.iter().map(|s| s.total_spent).sum()
}

// ============================================================================
// DATE GROUPS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateGroup {
    pub date: String,
    pub items: Vec<GroceryItem>,
}

/// Group items by purchase date, newest first
///
/// Unparseable dates sort after every real date, in first-seen order.
pub fn group_by_date(items: &[GroceryItem]) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let slot = *index.entry(item.date.as_str()).or_insert_with(|| {
            groups.push(DateGroup {
                date: item.date.clone(),
                items: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].items.push(item.clone());
    }

    groups.sort_by(|a, b| match (parse_date(&a.date), parse_date(&b.date)) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    groups
}

// ============================================================================
// TESTS
// ============================================================================
