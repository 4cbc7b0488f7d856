//! The consolidation pipeline: raw per-source records in, one
//! consolidated catalog out.
//!
//! Pure assembly — no I/O happens here. Reading source databases and
//! persisting the result live in [`crate::storage`]; this module only
//! decides what the new catalog contains. Row-level defects (bad
//! price, category filtered out during mapping) skip the row and are
//! counted; set-level defects abort before any write can happen.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::catmap::{self, CategoryCatalog};
use crate::config::AppConfig;
use crate::error::Result;
use crate::models::{Category, Product, SourceRecords, Store};
use crate::normalize::normalize_category;
use crate::storage;

/// Knobs of one consolidation run.
#[derive(Debug, Clone)]
pub struct ConsolidationOptions {
    /// Source whose taxonomy is canonical as-is.
    pub base_source: String,
    /// Minimum category similarity for merging onto the base taxonomy.
    pub merge_threshold: u32,
}

/// A fully built catalog, ready to replace the previous one.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub stores: Vec<Store>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
}

/// Counters observable after a run; row-level skips surface here
/// instead of aborting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsolidationReport {
    pub records_read: BTreeMap<String, usize>,
    pub duplicate_urls_dropped: usize,
    pub stores_total: usize,
    pub categories_total: usize,
    pub products_ingested: usize,
    pub skipped_invalid_price: usize,
    pub skipped_unmapped_category: usize,
}

/// Drop records whose URL was already seen within the same source.
/// Re-ingesting a source is idempotent at the raw-record level.
fn dedup_by_url(source: &SourceRecords, report: &mut ConsolidationReport) -> SourceRecords {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut kept = Vec::with_capacity(source.records.len());

    for record in &source.records {
        if seen.insert(record.source_url.as_str()) {
            kept.push(record.clone());
        } else {
            report.duplicate_urls_dropped += 1;
        }
    }

    report
        .records_read
        .insert(source.source_id.clone(), source.records.len());
    SourceRecords::new(source.source_id.clone(), source.display_name.clone(), kept)
}

/// Build the consolidated catalog from raw source records.
///
/// Fails before producing anything if the base source is missing or
/// no category survives normalization; otherwise total.
pub fn consolidate(
    sources: &[SourceRecords],
    options: &ConsolidationOptions,
) -> Result<(Catalog, ConsolidationReport)> {
    let mut report = ConsolidationReport::default();

    let sources: Vec<SourceRecords> = sources
        .iter()
        .map(|s| dedup_by_url(s, &mut report))
        .collect();

    let category_catalog: CategoryCatalog = catmap::build_canonical_categories(
        &sources,
        &options.base_source,
        options.merge_threshold,
    )?;

    let mut catalog = Catalog::default();
    let mut store_ids: HashMap<String, i64> = HashMap::new();
    for (idx, source) in sources.iter().enumerate() {
        let id = idx as i64 + 1;
        catalog
            .stores
            .push(Store::new(id, source.display_name.clone()));
        store_ids.insert(source.source_id.clone(), id);
    }

    let mut category_ids: HashMap<&str, i64> = HashMap::new();
    for (idx, canonical) in category_catalog.canonical.iter().enumerate() {
        let id = idx as i64 + 1;
        catalog
            .categories
            .push(Category::new(id, canonical.display_name.clone()));
        category_ids.insert(canonical.key.as_str(), id);
    }

    let mut next_product_id = 1i64;
    for source in &sources {
        let store_id = store_ids[&source.source_id];
        for record in &source.records {
            let key = normalize_category(&record.raw_category);
            let canonical_key = category_catalog.canonical_key(&key);
            let Some(&category_id) = (!key.is_empty())
                .then(|| category_ids.get(canonical_key))
                .flatten()
            else {
                warn!(
                    source = %record.source_id,
                    category = %record.raw_category,
                    name = %record.name,
                    "row skipped: category not in the canonical set"
                );
                report.skipped_unmapped_category += 1;
                continue;
            };

            let Ok(price) = record.price.trim().parse::<f64>() else {
                warn!(
                    source = %record.source_id,
                    name = %record.name,
                    price = %record.price,
                    "row skipped: unparseable price"
                );
                report.skipped_invalid_price += 1;
                continue;
            };

            catalog.products.push(Product::new(
                next_product_id,
                record.name.clone(),
                price,
                store_id,
                category_id,
            ));
            next_product_id += 1;
        }
    }

    report.stores_total = catalog.stores.len();
    report.categories_total = catalog.categories.len();
    report.products_ingested = catalog.products.len();
    info!(
        stores = report.stores_total,
        categories = report.categories_total,
        products = report.products_ingested,
        skipped_price = report.skipped_invalid_price,
        skipped_category = report.skipped_unmapped_category,
        "consolidation finished"
    );

    Ok((catalog, report))
}

/// End-to-end run: read every configured source, consolidate, swap the
/// new catalog in. The previous catalog survives any failure along the
/// way.
pub fn run_pipeline(config: &AppConfig) -> Result<ConsolidationReport> {
    let mut sources = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let records = storage::sources::read_source_records(
            &source.id,
            std::path::Path::new(&source.db_path),
            &source.table,
        )?;
        sources.push(SourceRecords::new(
            source.id.clone(),
            source.display_name.clone(),
            records,
        ));
    }

    let options = ConsolidationOptions {
        base_source: config.consolidation.base_source.clone(),
        merge_threshold: config.consolidation.category_merge_threshold,
    };
    let (catalog, report) = consolidate(&sources, &options)?;

    storage::database::write_catalog_atomic(&config.catalog_db_path(), &catalog)?;
    Ok(report)
}
