// 🛒 Grocery Item - the purchase record every other module reads
// Core fields come from the ingestion layer (manual entry or receipt confirmation)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Date format used for purchase dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// GROCERY ITEM
// ============================================================================

/// A single purchase: one item, one store, one price
///
/// Quantity is an opaque label ("1 kg", "2 pcs") and never enters arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryItem {
    /// Stable identity (UUID for records created here, opaque otherwise)
    #[serde(default)]
    pub id: String,

    pub item_name: String,

    pub store: String,

    #[serde(default)]
    pub quantity: String,

    pub price: f64,

    /// Purchase date (YYYY-MM-DD)
    #[serde(default)]
    pub date: String,

    /// When this record entered our system
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl GroceryItem {
    /// Compute idempotency hash for duplicate detection on import
    /// NOTE: This is for DEDUPLICATION, not IDENTITY (identity = id)
    pub fn idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}|{}",
            self.item_name, self.store, self.quantity, self.price, self.date
        ));
        format!("{:x}", hasher.finalize())
    }

    /// Comparison key for this item's name
    pub fn normalized_name(&self) -> String {
        normalize_item_name(&self.item_name)
    }

    /// Parse the purchase date (YYYY-MM-DD or MM/DD/YYYY)
    pub fn purchase_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

// ============================================================================
// NEW ITEM (creation input)
// ============================================================================

/// Fields a caller supplies to create an item; id and timestamps are assigned here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroceryItem {
    pub item_name: String,
    pub store: String,
    #[serde(default)]
    pub quantity: String,
    pub price: f64,
    #[serde(default)]
    pub date: Option<String>,
}

impl NewGroceryItem {
    pub fn new(item_name: &str, store: &str, quantity: &str, price: f64) -> Self {
        NewGroceryItem {
            item_name: item_name.to_string(),
            store: store.to_string(),
            quantity: quantity.to_string(),
            price,
            date: None,
        }
    }

    /// Set an explicit purchase date
    pub fn on(mut self, date: &str) -> Self {
        self.date = Some(date.to_string());
        self
    }

    /// Materialize into a stored record with a fresh UUID
    ///
    /// A missing date defaults to `today`.
    pub fn into_item(self, today: NaiveDate) -> GroceryItem {
        GroceryItem {
            id: uuid::Uuid::new_v4().to_string(),
            item_name: self.item_name,
            store: self.store,
            quantity: self.quantity,
            price: self.price,
            date: self
                .date
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| today.format(DATE_FORMAT).to_string()),
            created_at: Some(Utc::now()),
        }
    }
}

// ============================================================================
// ITEM UPDATE (partial)
// ============================================================================

/// Partial update - only supplied fields are overwritten
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.item_name.is_none()
            && self.store.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
    }

    /// Apply onto an existing record (id, date and created_at never change)
    pub fn apply_to(&self, item: &mut GroceryItem) {
        if let Some(name) = &self.item_name {
            item.item_name = name.clone();
        }
        if let Some(store) = &self.store {
            item.store = store.clone();
        }
        if let Some(quantity) = &self.quantity {
            item.quantity = quantity.clone();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Normalize an item name for grouping: lowercase + trim
///
/// Example: "  Greek Yogurt " → "greek yogurt"
pub fn normalize_item_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Parse date from string (supports YYYY-MM-DD and MM/DD/YYYY)
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    let trimmed = date_str.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Some(date);
    }

    None
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_item(name: &str, store: &str, price: f64) -> GroceryItem {
        GroceryItem {
            id: "1".to_string(),
            item_name: name.to_string(),
            store: store.to_string(),
            quantity: "1 kg".to_string(),
            price,
            date: "2024-01-15".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_idempotency_hash_stable() {
        let item = create_test_item("Milk", "Tesco", 1.50);

        let hash1 = item.idempotency_hash();
        let hash2 = item.idempotency_hash();

        assert_eq!(hash1, hash2, "Same item should produce same hash");
        assert_eq!(hash1.len(), 64, "SHA-256 hash should be 64 hex characters");
    }

    #[test]
    fn test_idempotency_hash_ignores_id() {
        let a = create_test_item("Milk", "Tesco", 1.50);
        let mut b = a.clone();
        b.id = "other".to_string();

        assert_eq!(a.idempotency_hash(), b.idempotency_hash());

        b.price = 1.49;
        assert_ne!(a.idempotency_hash(), b.idempotency_hash());
    }

    #[test]
    fn test_normalize_item_name() {
        assert_eq!(normalize_item_name("  Greek Yogurt "), "greek yogurt");
        assert_eq!(normalize_item_name("MILK"), "milk");
        assert_eq!(normalize_item_name(""), "");
    }

    #[test]
    fn test_new_item_defaults_date_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let item = NewGroceryItem::new("Eggs", "Aldi", "12 pcs", 2.10).into_item(today);

        assert_eq!(item.date, "2024-03-09");
        assert!(uuid::Uuid::parse_str(&item.id).is_ok());
        assert!(item.created_at.is_some());
    }

    #[test]
    fn test_new_item_keeps_explicit_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let item = NewGroceryItem::new("Eggs", "Aldi", "12 pcs", 2.10)
            .on("2024-01-01")
            .into_item(today);

        assert_eq!(item.date, "2024-01-01");
    }

    #[test]
    fn test_update_applies_only_supplied_fields() {
        let mut item = create_test_item("Milk", "Tesco", 1.50);
        let update = ItemUpdate {
            price: Some(1.35),
            ..Default::default()
        };

        update.apply_to(&mut item);

        assert_eq!(item.price, 1.35);
        assert_eq!(item.item_name, "Milk");
        assert_eq!(item.store, "Tesco");
        assert_eq!(item.date, "2024-01-15");
        assert!(!update.is_empty());
        assert!(ItemUpdate::default().is_empty());
    }

    #[test]
    fn test_serde_camel_case() {
        let item = create_test_item("Milk", "Tesco", 1.50);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["itemName"], "Milk");
        assert!(json.get("createdAt").is_none());

        let back: GroceryItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date("2024-01-15"), expected);
        assert_eq!(parse_date("01/15/2024"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }
}
