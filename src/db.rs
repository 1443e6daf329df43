use crate::item::{GroceryItem, ItemUpdate, NewGroceryItem, DATE_FORMAT};
use crate::repo::{today, ItemRepository, RepoError, RepoResult};
use crate::validation::{coerce_record, validate_item};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use std::path::Path;

const SELECT_COLUMNS: &str = "SELECT id, item_name, store, quantity, price, date, created_at
     FROM grocery_items";

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grocery_items (
            id TEXT PRIMARY KEY,
            idempotency_hash TEXT NOT NULL,
            item_name TEXT NOT NULL,
            store TEXT NOT NULL,
            quantity TEXT NOT NULL,
            price REAL NOT NULL,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_hash ON grocery_items(idempotency_hash)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_store ON grocery_items(store)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_date ON grocery_items(date)",
        [],
    )?;

    Ok(())
}

/// Outcome of a bulk insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub inserted: usize,
    pub duplicates: usize,
    /// Rows rejected before reaching the database (CSV import only)
    pub rejected: usize,
}

/// One CSV row as written by the export (every column is text)
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "itemName")]
    item_name: String,

    #[serde(rename = "store")]
    store: String,

    #[serde(rename = "quantity", default)]
    quantity: String,

    #[serde(rename = "price")]
    price: String,

    #[serde(rename = "date", default)]
    date: String,
}

/// A CSV row ready to insert, with the hash of the row as it was read
///
/// The hash is taken before a blank date is defaulted, so re-importing the
/// same file on another day still finds the earlier rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedItem {
    pub item: GroceryItem,
    pub hash: String,
}

/// Read `itemName,store,quantity,price,date` rows from a CSV file
///
/// Rows that fail to parse, coerce or validate are skipped and counted.
pub fn load_csv(csv_path: &Path) -> Result<(Vec<ImportedItem>, usize)> {
    load_csv_on(csv_path, today())
}

/// `load_csv` with an explicit date for rows that have none
pub fn load_csv_on(csv_path: &Path, today: NaiveDate) -> Result<(Vec<ImportedItem>, usize)> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .context("Failed to open CSV file")?;

    let mut items = Vec::new();
    let mut rejected = 0;

    for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
        // +2: header row and 1-based numbering
        let line = line + 2;

        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => {
                return Err(e).context("Failed to read CSV file");
            }
            Err(e) => {
                warn!("skipping CSV line {}: {}", line, e);
                rejected += 1;
                continue;
            }
        };

        let record = serde_json::json!({
            "itemName": row.item_name,
            "store": row.store,
            "quantity": row.quantity,
            "price": row.price,
            "date": row.date,
        });

        match coerce_record(&record) {
            Ok(mut item) => {
                let hash = item.idempotency_hash();
                item.id = uuid::Uuid::new_v4().to_string();
                if item.date.trim().is_empty() {
                    item.date = today.format(DATE_FORMAT).to_string();
                }
                item.created_at = Some(Utc::now());
                items.push(ImportedItem { item, hash });
            }
            Err(e) => {
                warn!("skipping CSV line {}: {}", line, e);
                rejected += 1;
            }
        }
    }

    Ok((items, rejected))
}

/// Insert items, skipping any whose idempotency hash is already stored
///
/// Manual entry never goes through here: buying the same thing twice on
/// the same day is legitimate, re-importing the same file is not.
pub fn insert_items(conn: &Connection, items: &[GroceryItem]) -> Result<ImportStats> {
    insert_hashed(conn, items.iter().map(|item| (item.idempotency_hash(), item)))
}

/// Insert CSV rows, deduplicating on the hash taken at read time
pub fn insert_imported(conn: &Connection, rows: &[ImportedItem]) -> Result<ImportStats> {
    insert_hashed(conn, rows.iter().map(|row| (row.hash.clone(), &row.item)))
}

fn insert_hashed<'a>(
    conn: &Connection,
    rows: impl Iterator<Item = (String, &'a GroceryItem)>,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for (hash, item) in rows {
        if hash_exists(conn, &hash)? {
            stats.duplicates += 1;
            continue;
        }

        insert_item(conn, item, &hash).context("Failed to insert grocery item")?;
        stats.inserted += 1;
    }

    info!(
        "inserted {} grocery items, skipped {} duplicates",
        stats.inserted, stats.duplicates
    );

    Ok(stats)
}

fn hash_exists(conn: &Connection, hash: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM grocery_items WHERE idempotency_hash = ?1 LIMIT 1",
            [hash],
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

fn insert_item(conn: &Connection, item: &GroceryItem, hash: &str) -> rusqlite::Result<()> {
    let created_at = item.created_at.unwrap_or_else(Utc::now);

    conn.execute(
        "INSERT INTO grocery_items (
            id, idempotency_hash, item_name, store, quantity, price, date, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            item.id,
            hash,
            item.item_name,
            item.store,
            item.quantity,
            item.price,
            item.date,
            created_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

fn row_to_item(row: &Row) -> rusqlite::Result<GroceryItem> {
    let created_at_str: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc));

    Ok(GroceryItem {
        id: row.get(0)?,
        item_name: row.get(1)?,
        store: row.get(2)?,
        quantity: row.get(3)?,
        price: row.get(4)?,
        date: row.get(5)?,
        created_at,
    })
}

pub fn get_all_items(conn: &Connection) -> Result<Vec<GroceryItem>> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC"))?;

    let items = stmt
        .query_map([], row_to_item)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

pub fn get_item(conn: &Connection, id: &str) -> Result<Option<GroceryItem>> {
    let item = conn
        .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], row_to_item)
        .optional()?;

    Ok(item)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM grocery_items", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// SQLITE REPOSITORY
// ============================================================================

/// ItemRepository backed by a SQLite connection
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database {:?}", db_path))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteRepository { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn require(&self, id: &str) -> RepoResult<GroceryItem> {
        get_item(&self.conn, id)?.ok_or_else(|| RepoError::NotFound(id.to_string()))
    }
}

impl ItemRepository for SqliteRepository {
    fn list(&self) -> RepoResult<Vec<GroceryItem>> {
        Ok(get_all_items(&self.conn)?)
    }

    fn get(&self, id: &str) -> RepoResult<GroceryItem> {
        self.require(id)
    }

    fn create(&mut self, item: NewGroceryItem) -> RepoResult<GroceryItem> {
        let item = item.into_item(today());
        validate_item(&item)?;

        insert_item(&self.conn, &item, &item.idempotency_hash())
            .context("Failed to insert grocery item")?;
        info!("created grocery item {} ({} @ {})", item.id, item.item_name, item.store);

        Ok(item)
    }

    fn update(&mut self, id: &str, update: ItemUpdate) -> RepoResult<GroceryItem> {
        let mut next = self.require(id)?;
        update.apply_to(&mut next);
        validate_item(&next)?;

        self.conn
            .execute(
                "UPDATE grocery_items
                 SET item_name = ?1, store = ?2, quantity = ?3, price = ?4, idempotency_hash = ?5
                 WHERE id = ?6",
                params![
                    next.item_name,
                    next.store,
                    next.quantity,
                    next.price,
                    next.idempotency_hash(),
                    id,
                ],
            )
            .context("Failed to update grocery item")?;
        info!("updated grocery item {}", id);

        Ok(next)
    }

    fn delete(&mut self, id: &str) -> RepoResult<GroceryItem> {
        let existing = self.require(id)?;

        self.conn
            .execute("DELETE FROM grocery_items WHERE id = ?1", [id])
            .context("Failed to delete grocery item")?;
        info!("deleted grocery item {}", id);

        Ok(existing)
    }
}
