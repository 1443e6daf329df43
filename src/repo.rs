// 📦 Item Repository - CRUD over grocery items
//
// The aggregation engine never touches storage; callers load a snapshot
// through a repository and hand the slice to aggregate/compare.
// InMemoryRepository is owned by its caller, so tests never share state.

use crate::item::{GroceryItem, ItemUpdate, NewGroceryItem};
use crate::validation::{validate_item, InvalidItemError};
use chrono::{NaiveDate, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("item not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Invalid(#[from] InvalidItemError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type RepoResult<T> = std::result::Result<T, RepoError>;

/// Storage seam for grocery items
pub trait ItemRepository {
    /// All items (order is defined by the implementation)
    fn list(&self) -> RepoResult<Vec<GroceryItem>>;

    fn get(&self, id: &str) -> RepoResult<GroceryItem>;

    /// Validate and store a new item, returning the stored record
    fn create(&mut self, item: NewGroceryItem) -> RepoResult<GroceryItem>;

    /// Apply a partial update; the result is validated before it is stored
    fn update(&mut self, id: &str, update: ItemUpdate) -> RepoResult<GroceryItem>;

    /// Delete by id, returning the removed record
    fn delete(&mut self, id: &str) -> RepoResult<GroceryItem>;
}

/// Today's date in UTC (default purchase date for new items)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ============================================================================
// IN-MEMORY REPOSITORY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    items: Vec<GroceryItem>,
}

impl InMemoryRepository {
    /// Create empty repository
    pub fn new() -> Self {
        InMemoryRepository { items: Vec::new() }
    }

    /// Create repository seeded with demo purchases
    pub fn with_sample_data() -> Self {
        InMemoryRepository {
            items: sample_items(),
        }
    }

    /// Drop every stored item
    pub fn reset(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: &str) -> RepoResult<usize> {
        self.items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }
}

impl ItemRepository for InMemoryRepository {
    fn list(&self) -> RepoResult<Vec<GroceryItem>> {
        Ok(self.items.clone())
    }

    fn get(&self, id: &str) -> RepoResult<GroceryItem> {
        let index = self.position(id)?;
        Ok(self.items[index].clone())
    }

    fn create(&mut self, item: NewGroceryItem) -> RepoResult<GroceryItem> {
        let item = item.into_item(today());
        validate_item(&item)?;
        self.items.push(item.clone());
        Ok(item)
    }

    fn update(&mut self, id: &str, update: ItemUpdate) -> RepoResult<GroceryItem> {
        let index = self.position(id)?;

        let mut next = self.items[index].clone();
        update.apply_to(&mut next);
        validate_item(&next)?;

        self.items[index] = next.clone();
        Ok(next)
    }

    fn delete(&mut self, id: &str) -> RepoResult<GroceryItem> {
        let index = self.position(id)?;
        Ok(self.items.remove(index))
    }
}

// ============================================================================
// SAMPLE DATA
// ============================================================================

/// Demo purchases: three comparable items plus one single-store item
pub fn sample_items() -> Vec<GroceryItem> {
    let rows = [
        ("1", "Milk", "Tesco", "1 kg", 1.50, "2024-01-15"),
        ("2", "Milk", "Asda", "1 kg", 1.25, "2024-01-15"),
        ("3", "Milk", "Aldi", "1 kg", 1.10, "2024-01-15"),
        ("4", "Bread", "Tesco", "800 g", 2.75, "2024-01-14"),
        ("5", "Bread", "Lidl", "800 g", 1.99, "2024-01-14"),
        ("6", "Greek Yogurt", "Asda", "500 g", 3.20, "2024-01-15"),
        ("7", "Greek Yogurt", "Tesco", "500 g", 3.50, "2024-01-14"),
        ("8", "Ground Coffee", "Aldi", "250 g", 4.50, "2024-01-14"),
    ];

    rows.iter()
        .map(|(id, name, store, quantity, price, date)| GroceryItem {
            id: id.to_string(),
            item_name: name.to_string(),
            store: store.to_string(),
            quantity: quantity.to_string(),
            price: *price,
            date: date.to_string(),
            created_at: None,
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_by_store;
    use crate::compare::compare_across_stores;

    #[test]
    fn test_create_and_get() {
        let mut repo = InMemoryRepository::new();

        let created = repo
            .create(NewGroceryItem::new("Milk", "Tesco", "1 kg", 1.50))
            .unwrap();

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get(&created.id).unwrap(), created);
    }

    #[test]
    fn test_create_rejects_invalid() {
        let mut repo = InMemoryRepository::new();

        let result = repo.create(NewGroceryItem::new("Milk", "Tesco", "1 kg", -1.0));

        assert!(matches!(
            result,
            Err(RepoError::Invalid(InvalidItemError::NegativePrice { .. }))
        ));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_update_keeps_identity() {
        let mut repo = InMemoryRepository::with_sample_data();

        let updated = repo
            .update(
                "1",
                ItemUpdate {
                    price: Some(1.40),
                    store: Some("Sainsbury's".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, "1");
        assert_eq!(updated.price, 1.40);
        assert_eq!(updated.store, "Sainsbury's");
        assert_eq!(updated.date, "2024-01-15");
        assert_eq!(repo.get("1").unwrap(), updated);
    }

    #[test]
    fn test_invalid_update_leaves_item_untouched() {
        let mut repo = InMemoryRepository::with_sample_data();

        let result = repo.update(
            "1",
            ItemUpdate {
                item_name: Some("  ".to_string()),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(RepoError::Invalid(_))));
        assert_eq!(repo.get("1").unwrap().item_name, "Milk");
    }

    #[test]
    fn test_delete_and_not_found() {
        let mut repo = InMemoryRepository::with_sample_data();

        let removed = repo.delete("8").unwrap();
        assert_eq!(removed.item_name, "Ground Coffee");
        assert_eq!(repo.len(), 7);

        assert!(matches!(repo.delete("8"), Err(RepoError::NotFound(_))));
        assert!(matches!(repo.get("missing"), Err(RepoError::NotFound(_))));
    }

    #[test]
    fn test_reset_isolates_state() {
        let mut repo = InMemoryRepository::with_sample_data();
        assert_eq!(repo.len(), 8);

        repo.reset();

        assert!(repo.is_empty());
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn test_sample_data_through_engine() {
        let repo = InMemoryRepository::with_sample_data();
        let items = repo.list().unwrap();

        let summaries = aggregate_by_store(&items);
        assert_eq!(summaries.len(), 4);
        assert_eq!(summaries[0].store, "Tesco");
        assert_eq!(summaries[0].item_count, 3);

        let comparisons = compare_across_stores(&items);
        let names: Vec<&str> = comparisons.iter().map(|c| c.item_name.as_str()).collect();
        // Bread 0.76, Milk 0.40, Greek Yogurt 0.30; Ground Coffee has one store
        assert_eq!(names, vec!["Bread", "Milk", "Greek Yogurt"]);
    }
}
