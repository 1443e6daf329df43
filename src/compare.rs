// ⚖️ Cross-Store Comparator - find where each item is cheapest
//
// Items are grouped by normalized name (lowercase + trim); store names are
// compared exactly. A group is comparable only when it spans 2+ distinct
// stores AND has a strictly positive price spread.

use crate::item::GroceryItem;
use log::debug;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

// ============================================================================
// PRICE COMPARISON
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceComparison {
    /// Display name: original casing of the first item seen in the group
    pub item_name: String,

    pub cheapest: GroceryItem,

    pub most_expensive: GroceryItem,

    /// most_expensive.price - cheapest.price (always > 0 in output)
    pub savings: f64,

    /// savings / most_expensive.price * 100, one decimal ("26.7")
    pub savings_percentage: String,

    /// The whole group, in input order
    pub all_stores: Vec<GroceryItem>,

    /// Number of items in the group (not distinct stores)
    pub store_count: usize,
}

impl PriceComparison {
    /// Group members ordered cheapest first, for display
    pub fn stores_by_price(&self) -> Vec<&GroceryItem> {
        let mut sorted: Vec<&GroceryItem> = self.all_stores.iter().collect();
        sorted.sort_by(|a, b| a.price.total_cmp(&b.price));
        sorted
    }

    /// Number of distinct store names in the group
    pub fn distinct_store_count(&self) -> usize {
        self.all_stores
            .iter()
            .map(|i| i.store.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

// ============================================================================
// COMPARATOR
// ============================================================================

/// Compare prices for every item bought at two or more stores
///
/// Output is sorted by savings, highest first; equal savings keep the order
/// in which their groups were first seen.
pub fn compare_across_stores(items: &[GroceryItem]) -> Vec<PriceComparison> {
    let groups = group_by_name(items);
    let group_count = groups.len();

    let mut comparisons: Vec<PriceComparison> = groups
        .into_iter()
        .filter(|group| spans_multiple_stores(group))
        .filter_map(build_comparison)
        .collect();

    comparisons.sort_by(|a, b| b.savings.total_cmp(&a.savings));

    debug!(
        "compared {} items: {} name groups, {} comparable",
        items.len(),
        group_count,
        comparisons.len()
    );

    comparisons
}

/// Sum of savings across all comparisons
pub fn total_potential_savings(comparisons: &[PriceComparison]) -> f64 {
    comparisons.iter().map(|c| c.savings).sum()
}

/// Group by normalized name, groups in first-seen order, items in input order
fn group_by_name(items: &[GroceryItem]) -> Vec<Vec<GroceryItem>> {
    let mut groups: Vec<Vec<GroceryItem>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let slot = *index.entry(item.normalized_name()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(item.clone());
    }

    groups
}

fn spans_multiple_stores(group: &[GroceryItem]) -> bool {
    let stores: HashSet<&str> = group.iter().map(|i| i.store.as_str()).collect();
    stores.len() >= 2
}

/// Build the comparison for one group; None when there is no price spread
fn build_comparison(group: Vec<GroceryItem>) -> Option<PriceComparison> {
    // Stable sort: equal prices keep input order
    let mut sorted: Vec<&GroceryItem> = group.iter().collect();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price));

    let cheapest = (*sorted.first()?).clone();
    let most_expensive = (*sorted.last()?).clone();

    let savings = most_expensive.price - cheapest.price;
    if savings.is_nan() || savings <= 0.0 {
        return None;
    }

    Some(PriceComparison {
        item_name: group[0].item_name.clone(),
        savings_percentage: savings_percentage(savings, most_expensive.price),
        cheapest,
        most_expensive,
        savings,
        store_count: group.len(),
        all_stores: group,
    })
}

/// Percentage of the highest price saved, formatted to one decimal
///
/// Zero savings (which also covers a zero highest price) yields "0.0".
pub fn savings_percentage(savings: f64, highest_price: f64) -> String {
    if savings <= 0.0 {
        return "0.0".to_string();
    }
    format!("{:.1}", savings / highest_price * 100.0)
}

// ============================================================================
// TESTS
// ============================================================================
