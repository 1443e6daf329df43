use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

// Use library instead of local modules
use grocery_ledger::{
    aggregate_by_store, compare_across_stores, grand_total, insert_imported, insert_items,
    load_csv, logging::init_logging, repo::sample_items, sort_by_total_spent, total_potential_savings,
    validate_batch, verify_count, GroceryItem, ItemDraft, ItemRepository, Settings,
    SqliteRepository, StoreMatcher,
};

#[derive(Parser)]
#[command(name = "grocery-ledger", version, about = "Track grocery spending and compare prices across stores")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import purchases from a CSV file (itemName,store,quantity,price,date)
    Import {
        csv: PathBuf,

        /// Map receipt store names ("TESCO EXTRA #12") onto the known store list
        #[arg(long)]
        match_stores: bool,
    },

    /// List every recorded purchase, newest first
    List,

    /// Record a purchase
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        store: String,
        #[arg(long)]
        quantity: String,
        #[arg(long, default_value = "kg")]
        unit: String,
        #[arg(long)]
        price: String,
    },

    /// Delete a purchase by id
    Delete { id: String },

    /// Spending per store, highest first
    Stores,

    /// Items bought at 2+ stores, biggest savings first
    Compare,

    /// Insert the demo purchases
    Seed,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings;

    settings.validate()?;
    init_logging(&settings.log_level)?;

    let mut repo = SqliteRepository::open(&settings.database_path)?;

    match cli.command {
        Command::Import { csv, match_stores } => run_import(&repo, &csv, match_stores)?,
        Command::List => run_list(&repo, &settings)?,
        Command::Add {
            name,
            store,
            quantity,
            unit,
            price,
        } => {
            let draft = ItemDraft {
                item_name: name,
                store,
                quantity_value: quantity,
                quantity_unit: unit,
                price,
            };
            let item = repo.create(draft.into_new_item()?)?;
            println!(
                "✓ Added {} ({}) at {} for {}",
                item.item_name,
                item.quantity,
                item.store,
                settings.format_price(item.price)
            );
            println!("  id: {}", item.id);
        }
        Command::Delete { id } => {
            let removed = repo.delete(&id)?;
            println!("✓ Removed {} from {}", removed.item_name, removed.store);
        }
        Command::Stores => run_stores(&repo, &settings)?,
        Command::Compare => run_compare(&repo, &settings)?,
        Command::Seed => {
            let stats = insert_items(repo.connection(), &sample_items())?;
            println!("✓ Seeded {} demo purchases ({} already present)", stats.inserted, stats.duplicates);
        }
    }

    Ok(())
}

fn run_import(repo: &SqliteRepository, csv_path: &Path, match_stores: bool) -> Result<()> {
    println!("🗄️  Import - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading CSV...");
    let (mut items, rejected) =
        load_csv(csv_path).with_context(|| format!("Failed to import {:?}", csv_path))?;
    println!("✓ Loaded {} purchases ({} rows rejected)", items.len(), rejected);

    if match_stores {
        let matcher = StoreMatcher::with_defaults();
        let mut unmatched = 0;
        for row in &mut items {
            match matcher.match_store_name(&row.item.store) {
                Some(store) => row.item.store = store.to_string(),
                None => unmatched += 1,
            }
        }
        println!("✓ Matched store names ({} left as recorded)", unmatched);
    }

    println!("\n💾 Inserting purchases...");
    let mut stats = insert_imported(repo.connection(), &items)?;
    stats.rejected = rejected;
    println!("✓ Inserted: {}", stats.inserted);
    println!("✓ Skipped duplicates: {}", stats.duplicates);
    println!("✓ Rejected rows: {}", stats.rejected);

    println!("\n🔍 Verifying database...");
    let count = verify_count(repo.connection())?;
    println!("✓ Database contains {} purchases", count);

    Ok(())
}

fn run_list(repo: &SqliteRepository, settings: &Settings) -> Result<()> {
    let items = repo.list()?;

    if items.is_empty() {
        println!("No items yet. Add one with `grocery-ledger add` or `grocery-ledger import`.");
        return Ok(());
    }

    for group in grocery_ledger::group_by_date(&items) {
        println!("\n📅 {}", group.date);
        for item in &group.items {
            println!(
                "   {:<24} {:<12} {:<10} {:>9}   {}",
                item.item_name,
                item.store,
                item.quantity,
                settings.format_price(item.price),
                item.id
            );
        }
    }

    Ok(())
}

/// Load every item and drop any record that would corrupt the totals
fn load_snapshot(repo: &SqliteRepository) -> Result<Vec<GroceryItem>> {
    let batch = validate_batch(&repo.list()?);
    if !batch.is_clean() {
        eprintln!("⚠️  Skipping invalid records: {}", batch.summary());
    }
    Ok(batch.accepted)
}

fn run_stores(repo: &SqliteRepository, settings: &Settings) -> Result<()> {
    let items = load_snapshot(repo)?;
    let mut summaries = aggregate_by_store(&items);

    if summaries.is_empty() {
        println!("No store data. Add some grocery items to see store summaries.");
        return Ok(());
    }

    sort_by_total_spent(&mut summaries);

    println!("🏪 Spending by store");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for summary in &summaries {
        println!(
            "   {:<16} {:>3} items   {:>10}",
            summary.store,
            summary.item_count,
            settings.format_price(summary.total_spent)
        );
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Total spent: {}", settings.format_price(grand_total(&summaries)));

    Ok(())
}

fn run_compare(repo: &SqliteRepository, settings: &Settings) -> Result<()> {
    let items = load_snapshot(repo)?;
    let comparisons = compare_across_stores(&items);

    if comparisons.is_empty() {
        println!("No items to compare. Add the same item from different stores to see price comparisons.");
        return Ok(());
    }

    println!("⚖️  Price comparison ({} items)", comparisons.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for comparison in &comparisons {
        println!(
            "\n   {} - save {} ({}%)",
            comparison.item_name,
            settings.format_price(comparison.savings),
            comparison.savings_percentage
        );
        println!(
            "   cheapest: {} @ {}   most expensive: {} @ {}",
            comparison.cheapest.store,
            settings.format_price(comparison.cheapest.price),
            comparison.most_expensive.store,
            settings.format_price(comparison.most_expensive.price)
        );
        for item in comparison.stores_by_price() {
            println!(
                "      {:<16} {:>9}   {}",
                item.store,
                settings.format_price(item.price),
                item.quantity
            );
        }
    }
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "   Total potential savings: {}",
        settings.format_price(total_potential_savings(&comparisons))
    );

    Ok(())
}
