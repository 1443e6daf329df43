// ✅ Input Validation - the edge between ingestion and aggregation
//
// Records must be shape-checked before they reach the aggregator or the
// comparator: a NaN or negative price silently corrupts every sum downstream.
// Rejected records are reported and excluded, never aggregated.

use crate::item::{GroceryItem, ItemUpdate, NewGroceryItem};
use log::warn;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidItemError {
    #[error("item {id:?}: item name is missing")]
    MissingItemName { id: String },

    #[error("item {id:?}: store is missing")]
    MissingStore { id: String },

    #[error("item {id:?}: price {value:?} is not a number")]
    NonNumericPrice { id: String, value: String },

    #[error("item {id:?}: price {price} is negative")]
    NegativePrice { id: String, price: f64 },

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("quantity {value:?} must be a number greater than zero")]
    InvalidQuantity { value: String },

    #[error("price {value:?} must be greater than zero")]
    PriceNotPositive { value: String },

    #[error("{field} must be text")]
    NotText { field: &'static str },

    #[error("request body must be a JSON object")]
    NotAnObject,
}

impl InvalidItemError {
    /// Id of the offending record (empty for form drafts)
    pub fn item_id(&self) -> &str {
        match self {
            InvalidItemError::MissingItemName { id }
            | InvalidItemError::MissingStore { id }
            | InvalidItemError::NonNumericPrice { id, .. }
            | InvalidItemError::NegativePrice { id, .. } => id,
            _ => "",
        }
    }
}

// ============================================================================
// SINGLE RECORD + BATCH
// ============================================================================

/// Validate one record: name and store present, price finite and >= 0
pub fn validate_item(item: &GroceryItem) -> Result<(), InvalidItemError> {
    if item.item_name.trim().is_empty() {
        return Err(InvalidItemError::MissingItemName {
            id: item.id.clone(),
        });
    }

    if item.store.trim().is_empty() {
        return Err(InvalidItemError::MissingStore {
            id: item.id.clone(),
        });
    }

    if !item.price.is_finite() {
        return Err(InvalidItemError::NonNumericPrice {
            id: item.id.clone(),
            value: item.price.to_string(),
        });
    }

    if item.price < 0.0 {
        return Err(InvalidItemError::NegativePrice {
            id: item.id.clone(),
            price: item.price,
        });
    }

    Ok(())
}

/// Result of validating a batch: clean records in input order + rejections
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    pub accepted: Vec<GroceryItem>,
    pub rejected: Vec<InvalidItemError>,
}

impl ValidatedBatch {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} accepted, {} rejected",
            self.accepted.len(),
            self.rejected.len()
        )
    }
}

/// Split a batch into accepted and rejected records
pub fn validate_batch(items: &[GroceryItem]) -> ValidatedBatch {
    let mut batch = ValidatedBatch::default();

    for item in items {
        match validate_item(item) {
            Ok(()) => batch.accepted.push(item.clone()),
            Err(e) => {
                warn!("rejecting grocery item: {}", e);
                batch.rejected.push(e);
            }
        }
    }

    batch
}

// ============================================================================
// COERCION (external JSON → GroceryItem)
// ============================================================================

/// Coerce an externally supplied JSON record into a validated item
///
/// `price` may arrive as a number or a numeric string. Ids may be numbers.
pub fn coerce_record(record: &Value) -> Result<GroceryItem, InvalidItemError> {
    let id = match record.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let item_name = text_field(record, "itemName");
    if item_name.trim().is_empty() {
        return Err(InvalidItemError::MissingItemName { id });
    }

    let store = text_field(record, "store");
    if store.trim().is_empty() {
        return Err(InvalidItemError::MissingStore { id });
    }

    let price = coerce_price(&id, record.get("price"))?;

    let item = GroceryItem {
        id,
        item_name,
        store,
        quantity: text_field(record, "quantity"),
        price,
        date: text_field(record, "date"),
        created_at: None,
    };

    validate_item(&item)?;
    Ok(item)
}

/// Coerce a partial update body; absent or null fields are left unchanged
pub fn coerce_update(body: &Value) -> Result<ItemUpdate, InvalidItemError> {
    let fields = body.as_object().ok_or(InvalidItemError::NotAnObject)?;

    let text = |key: &'static str| match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(InvalidItemError::NotText { field: key }),
    };

    let price = match fields.get("price") {
        None | Some(Value::Null) => None,
        value => Some(coerce_price("", value)?),
    };

    Ok(ItemUpdate {
        item_name: text("itemName")?,
        store: text("store")?,
        quantity: text("quantity")?,
        price,
    })
}

/// Price as a JSON number or a numeric string
fn coerce_price(id: &str, value: Option<&Value>) -> Result<f64, InvalidItemError> {
    let price = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    price.ok_or_else(|| InvalidItemError::NonNumericPrice {
        id: id.to_string(),
        value: value.map(|v| v.to_string()).unwrap_or_default(),
    })
}

fn text_field(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// MANUAL ENTRY DRAFT
// ============================================================================

/// Raw manual-entry form values (all text, as typed)
#[derive(Debug, Clone, Serialize)]
pub struct ItemDraft {
    pub item_name: String,
    pub store: String,
    pub quantity_value: String,
    pub quantity_unit: String,
    pub price: String,
}

impl ItemDraft {
    /// Check the draft and build a creation request
    ///
    /// Quantity and price must both parse to numbers strictly above zero.
    pub fn into_new_item(self) -> Result<NewGroceryItem, InvalidItemError> {
        let required = [
            ("itemName", &self.item_name),
            ("store", &self.store),
            ("quantity", &self.quantity_value),
            ("price", &self.price),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(InvalidItemError::MissingField { field });
            }
        }

        match self.quantity_value.trim().parse::<f64>() {
            Ok(q) if q.is_finite() && q > 0.0 => {}
            _ => {
                return Err(InvalidItemError::InvalidQuantity {
                    value: self.quantity_value,
                })
            }
        }

        let price = self
            .price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or_else(|| InvalidItemError::NonNumericPrice {
                id: String::new(),
                value: self.price.clone(),
            })?;
        if price <= 0.0 {
            return Err(InvalidItemError::PriceNotPositive { value: self.price });
        }

        let unit = if self.quantity_unit.trim().is_empty() {
            "kg"
        } else {
            self.quantity_unit.trim()
        };

        Ok(NewGroceryItem::new(
            self.item_name.trim(),
            self.store.trim(),
            &format!("{} {}", self.quantity_value.trim(), unit),
            price,
        ))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_item(id: &str, name: &str, store: &str, price: f64) -> GroceryItem {
        GroceryItem {
            id: id.to_string(),
            item_name: name.to_string(),
            store: store.to_string(),
            quantity: "1 kg".to_string(),
            price,
            date: "2024-01-15".to_string(),
            created_at: None,
        }
    }

    fn draft(name: &str, store: &str, qty: &str, price: &str) -> ItemDraft {
        ItemDraft {
            item_name: name.to_string(),
            store: store.to_string(),
            quantity_value: qty.to_string(),
            quantity_unit: "kg".to_string(),
            price: price.to_string(),
        }
    }

    #[test]
    fn test_validate_valid_item() {
        assert!(validate_item(&create_test_item("1", "Milk", "Tesco", 1.50)).is_ok());
        // Free items are allowed
        assert!(validate_item(&create_test_item("2", "Sample", "Aldi", 0.0)).is_ok());
    }

    #[test]
    fn test_validate_missing_name_and_store() {
        assert_eq!(
            validate_item(&create_test_item("1", "   ", "Tesco", 1.0)),
            Err(InvalidItemError::MissingItemName { id: "1".to_string() })
        );
        assert_eq!(
            validate_item(&create_test_item("2", "Milk", "", 1.0)),
            Err(InvalidItemError::MissingStore { id: "2".to_string() })
        );
    }

    #[test]
    fn test_validate_bad_prices() {
        let nan = validate_item(&create_test_item("1", "Milk", "Tesco", f64::NAN));
        assert!(matches!(nan, Err(InvalidItemError::NonNumericPrice { .. })));

        let inf = validate_item(&create_test_item("1", "Milk", "Tesco", f64::INFINITY));
        assert!(matches!(inf, Err(InvalidItemError::NonNumericPrice { .. })));

        let negative = validate_item(&create_test_item("3", "Milk", "Tesco", -0.5));
        assert!(matches!(negative, Err(InvalidItemError::NegativePrice { .. })));
        assert_eq!(negative.unwrap_err().item_id(), "3");
    }

    #[test]
    fn test_validate_batch_excludes_rejected() {
        let items = vec![
            create_test_item("1", "Milk", "Tesco", 1.50),
            create_test_item("2", "Milk", "Asda", f64::NAN),
            create_test_item("3", "Bread", "", 2.00),
            create_test_item("4", "Bread", "Lidl", 1.99),
        ];

        let batch = validate_batch(&items);

        assert_eq!(batch.accepted.len(), 2);
        assert_eq!(batch.accepted[0].id, "1");
        assert_eq!(batch.accepted[1].id, "4");
        assert_eq!(batch.rejected.len(), 2);
        assert!(!batch.is_clean());
        assert_eq!(batch.summary(), "2 accepted, 2 rejected");
    }

    #[test]
    fn test_coerce_record_string_price() {
        let record = json!({
            "id": 7,
            "itemName": "Greek Yogurt",
            "store": "Asda",
            "quantity": "500 g",
            "price": " 3.20 ",
            "date": "2024-01-15"
        });

        let item = coerce_record(&record).unwrap();

        assert_eq!(item.id, "7");
        assert_eq!(item.price, 3.20);
        assert_eq!(item.quantity, "500 g");
    }

    #[test]
    fn test_coerce_record_rejects_bad_shapes() {
        let no_name = json!({"store": "Asda", "price": 1.0});
        assert!(matches!(
            coerce_record(&no_name),
            Err(InvalidItemError::MissingItemName { .. })
        ));

        let bad_price = json!({"id": "x", "itemName": "Milk", "store": "Asda", "price": "cheap"});
        assert_eq!(
            coerce_record(&bad_price),
            Err(InvalidItemError::NonNumericPrice {
                id: "x".to_string(),
                value: "\"cheap\"".to_string()
            })
        );

        let missing_price = json!({"itemName": "Milk", "store": "Asda"});
        assert!(matches!(
            coerce_record(&missing_price),
            Err(InvalidItemError::NonNumericPrice { .. })
        ));

        let negative = json!({"itemName": "Milk", "store": "Asda", "price": -1});
        assert!(matches!(
            coerce_record(&negative),
            Err(InvalidItemError::NegativePrice { .. })
        ));
    }

    #[test]
    fn test_coerce_update_partial_fields() {
        let update = coerce_update(&json!({"price": "1.50", "store": "Asda"})).unwrap();
        assert_eq!(update.price, Some(1.50));
        assert_eq!(update.store.as_deref(), Some("Asda"));
        assert!(update.item_name.is_none());

        let update = coerce_update(&json!({"price": null, "quantity": "2 pcs"})).unwrap();
        assert!(update.price.is_none());
        assert_eq!(update.quantity.as_deref(), Some("2 pcs"));

        assert!(coerce_update(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_coerce_update_rejects_bad_shapes() {
        assert!(matches!(
            coerce_update(&json!({"price": "cheap"})),
            Err(InvalidItemError::NonNumericPrice { .. })
        ));
        assert_eq!(
            coerce_update(&json!({"store": 5})),
            Err(InvalidItemError::NotText { field: "store" })
        );
        assert_eq!(coerce_update(&json!([1, 2])), Err(InvalidItemError::NotAnObject));
    }

    #[test]
    fn test_draft_builds_quantity_label() {
        let new_item = draft(" Milk ", "Tesco", "2", "1.50").into_new_item().unwrap();

        assert_eq!(new_item.item_name, "Milk");
        assert_eq!(new_item.quantity, "2 kg");
        assert_eq!(new_item.price, 1.50);
    }

    #[test]
    fn test_draft_rejections() {
        assert_eq!(
            draft("Milk", "", "1", "1.0").into_new_item(),
            Err(InvalidItemError::MissingField { field: "store" })
        );
        assert!(matches!(
            draft("Milk", "Tesco", "0", "1.0").into_new_item(),
            Err(InvalidItemError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            draft("Milk", "Tesco", "1", "abc").into_new_item(),
            Err(InvalidItemError::NonNumericPrice { .. })
        ));
        assert!(matches!(
            draft("Milk", "Tesco", "1", "0").into_new_item(),
            Err(InvalidItemError::PriceNotPositive { .. })
        ));
    }
}
