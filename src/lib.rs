// Grocery Ledger - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod item;
pub mod validation;
pub mod aggregate;   // Store Aggregator: spending per store
pub mod compare;     // Cross-Store Comparator: cheapest store per item
pub mod stores;      // Receipt store-name matching
pub mod repo;
pub mod db;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use item::{GroceryItem, ItemUpdate, NewGroceryItem, normalize_item_name};
pub use validation::{
    InvalidItemError, ItemDraft, ValidatedBatch,
    coerce_record, coerce_update, validate_batch, validate_item,
};
pub use aggregate::{
    DateGroup, StoreSummary,
    aggregate_by_store, grand_total, group_by_date, sort_by_total_spent,
};
pub use compare::{PriceComparison, compare_across_stores, total_potential_savings};
pub use stores::StoreMatcher;
pub use repo::{InMemoryRepository, ItemRepository, RepoError, RepoResult};
pub use db::{
    ImportStats, ImportedItem, SqliteRepository,
    insert_imported, insert_items, load_csv, setup_database, verify_count,
};
pub use config::Settings;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
