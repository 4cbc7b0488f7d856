use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pricemerge_core::{AppConfig, CategoryView, Database, run_pipeline};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "pricemerge",
    about = "Consolidates scraped grocery catalogs into one comparable database",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts and agents).
    /// Also enabled by setting PRICEMERGE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read every configured source and rebuild the catalog.
    Consolidate,

    /// List the canonical categories.
    Categories,

    /// Show one category grouped into exact / similar / unique products.
    Category {
        id: i64,
        /// Override the lower similarity bound for this run.
        #[arg(long)]
        min: Option<u32>,
        /// Override the upper similarity bound for this run.
        #[arg(long)]
        max: Option<u32>,
    },

    /// Search products by name across all stores.
    Search {
        query: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show catalog totals.
    Stats,

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run diagnostics on config, sources and catalog.
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Get a specific config key.
    Get { key: String },
    /// Print the config file path.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json || std::env::var("PRICEMERGE_JSON").as_deref() == Ok("1");

    let config = AppConfig::load()?;

    match cli.command {
        Commands::Consolidate => {
            let report = run_pipeline(&config)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": report,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Consolidation finished:");
                for (source, rows) in &report.records_read {
                    println!("  {source}: {rows} rows read");
                }
                println!("  Stores:     {}", report.stores_total);
                println!("  Categories: {}", report.categories_total);
                println!("  Products:   {}", report.products_ingested);
                if report.duplicate_urls_dropped > 0 {
                    println!("  Dropped duplicate URLs: {}", report.duplicate_urls_dropped);
                }
                if report.skipped_invalid_price > 0 {
                    println!("  Skipped (bad price):    {}", report.skipped_invalid_price);
                }
                if report.skipped_unmapped_category > 0 {
                    println!(
                        "  Skipped (no category):  {}",
                        report.skipped_unmapped_category
                    );
                }
            }
        }

        Commands::Categories => {
            let db = open_catalog(&config)?;
            let categories = db.list_categories()?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": categories, "total": categories.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if categories.is_empty() {
                println!("No categories. Run `pricemerge consolidate` first.");
            } else {
                for category in &categories {
                    println!("{:>4}  {}", category.id, category.canonical_name);
                }
            }
        }

        Commands::Category { id, min, max } => {
            let db = open_catalog(&config)?;
            let mut thresholds = config.cluster_thresholds();
            if let Some(min) = min {
                thresholds.similar_min = min;
            }
            if let Some(max) = max {
                thresholds.similar_max = max;
            }

            let view = db.category_view(id, thresholds)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": view,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                print_category_view(&view);
            }
        }

        Commands::Search { query, limit } => {
            let db = open_catalog(&config)?;
            let mut hits = db.search_products(&query)?;
            let total = hits.len();
            hits.truncate(limit);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": hits, "total": total, "query": query },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if hits.is_empty() {
                println!("No results for: {query}");
            } else {
                println!("Found {total} result(s):");
                for hit in &hits {
                    println!(
                        "  {:<30} {:>8.2}  {} / {}",
                        hit.product.name, hit.product.price, hit.store_name, hit.category_name
                    );
                }
            }
        }

        Commands::Stats => {
            let db = open_catalog(&config)?;
            let stats = db.stats()?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": stats,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Catalog statistics:");
                println!("  Stores:     {}", stats.stores);
                println!("  Categories: {}", stats.categories);
                println!("  Products:   {}", stats.products);
            }
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::List => {
                    let kv = config_key_values(&config);
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": kv,
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else {
                        let mut keys: Vec<_> = kv.keys().collect();
                        keys.sort();
                        for k in keys {
                            println!("{k} = {}", kv[k]);
                        }
                    }
                }
                ConfigAction::Get { key } => {
                    let kv = config_key_values(&config);
                    match kv.get(key.as_str()) {
                        Some(val) => {
                            if json_output {
                                print_json(&serde_json::json!({
                                    "status": "ok",
                                    "data": { "key": key, "value": val },
                                    "meta": { "duration_ms": dur }
                                }))?;
                            } else {
                                println!("{val}");
                            }
                        }
                        None => {
                            eprintln!("Unknown config key: {key}");
                            std::process::exit(2);
                        }
                    }
                }
                ConfigAction::Path => {
                    let path = AppConfig::config_path();
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": { "path": path },
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
            }
        }

        // ── Doctor ─────────────────────────────────────────────────────────

        Commands::Doctor => {
            let config_path = AppConfig::config_path();
            if config_path.exists() {
                println!("✓ Config: {}", config_path.display());
            } else {
                println!("○ Config: not found (using defaults)");
            }

            let mut issues = 0;
            for source in &config.sources {
                let path = Path::new(&source.db_path);
                if path.exists() {
                    println!("✓ Source {}: {}", source.id, source.db_path);
                } else {
                    issues += 1;
                    println!("✗ Source {}: {} missing", source.id, source.db_path);
                }
            }

            let catalog_path = config.catalog_db_path();
            if catalog_path.exists() {
                match Database::open(&catalog_path) {
                    Ok(db) => {
                        let stats = db.stats()?;
                        println!(
                            "✓ Catalog: {} ({} products)",
                            catalog_path.display(),
                            stats.products
                        );
                    }
                    Err(e) => {
                        issues += 1;
                        println!("✗ Catalog: {e}");
                    }
                }
            } else {
                println!("○ Catalog: not built yet (run `pricemerge consolidate`)");
            }

            if issues == 0 {
                println!("\nAll checks passed ✓");
            } else {
                println!("\n{issues} issue(s) found");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn config_key_values(config: &AppConfig) -> std::collections::HashMap<&'static str, String> {
    let mut map = std::collections::HashMap::new();
    map.insert("catalog.db_path", config.catalog.db_path.clone());
    map.insert("consolidation.base_source", config.consolidation.base_source.clone());
    map.insert(
        "consolidation.similar_min",
        config.consolidation.similar_min.to_string(),
    );
    map.insert(
        "consolidation.similar_max",
        config.consolidation.similar_max.to_string(),
    );
    map.insert(
        "consolidation.category_merge_threshold",
        config.consolidation.category_merge_threshold.to_string(),
    );
    map.insert(
        "sources",
        config
            .sources
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    );
    map
}

fn open_catalog(config: &AppConfig) -> Result<Database> {
    let path = config.catalog_db_path();
    if !path.exists() {
        anyhow::bail!(
            "catalog database not found at {} — run `pricemerge consolidate` first",
            path.display()
        );
    }
    Ok(Database::open(&path)?)
}

fn print_category_view(view: &CategoryView) {
    if !view.exact_multi_store.is_empty() {
        println!("Same product, multiple stores:");
        for group in &view.exact_multi_store {
            println!("  {}", group.display_name);
            for (store, products) in &group.by_store {
                for product in products {
                    println!("    {store}: {:.2}", product.price);
                }
            }
        }
    }

    if !view.similar.is_empty() {
        println!("Similar products:");
        for group in &view.similar {
            println!("  {}", group.display_name);
            for (store, products) in &group.by_store {
                for product in products {
                    println!("    {store}: {} — {:.2}", product.name, product.price);
                }
            }
        }
    }

    if !view.unique.is_empty() {
        println!("Only in one store:");
        for product in &view.unique {
            println!("  {} — {:.2}", product.name, product.price);
        }
    }

    if view.exact_multi_store.is_empty() && view.similar.is_empty() && view.unique.is_empty() {
        println!("Category is empty.");
    }
}
