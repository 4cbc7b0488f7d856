//! Cross-source category mapping.
//!
//! Each source carries its own category taxonomy. One source is
//! designated the base: its normalized categories are canonical as-is,
//! and every other source's categories are either merged onto the best
//! matching base category or promoted to new canonical categories.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::models::SourceRecords;
use crate::normalize::{normalize_category, title_case};
use crate::similarity::category_similarity;

/// Score at or above which a non-base category is merged onto a base
/// category instead of becoming its own canonical category.
pub const DEFAULT_MERGE_THRESHOLD: u32 = 75;

/// One canonical category identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCategory {
    /// Normalized key, the equality basis for matching.
    pub key: String,
    /// Display string: the first non-empty raw label found for this
    /// key, scanning non-base sources before the base source.
    pub display_name: String,
}

/// Result of one mapping run. Ephemeral: rebuilt on every
/// consolidation, never persisted beyond that run's output.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    /// Canonical categories, sorted by key.
    pub canonical: Vec<CanonicalCategory>,
    /// Non-base normalized key -> canonical key. Unmerged non-base
    /// keys map to themselves.
    pub mapping: HashMap<String, String>,
}

impl CategoryCatalog {
    /// Canonical key for any source's normalized category key.
    /// Base keys are their own canonical form.
    pub fn canonical_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.mapping.get(key).map(String::as_str).unwrap_or(key)
    }
}

fn normalized_keys(source: &SourceRecords) -> BTreeSet<String> {
    source
        .records
        .iter()
        .map(|r| normalize_category(&r.raw_category))
        .filter(|k| !k.is_empty())
        .collect()
}

/// Build the canonical category set and the cross-source mapping.
///
/// Fails with [`CatalogError::MissingBaseSource`] if `base_source`
/// does not name one of `sources`, and with
/// [`CatalogError::EmptyCanonicalCategorySet`] if no category survives
/// normalization anywhere; both happen before anything is persisted.
pub fn build_canonical_categories(
    sources: &[SourceRecords],
    base_source: &str,
    merge_threshold: u32,
) -> Result<CategoryCatalog> {
    let base = sources
        .iter()
        .find(|s| s.source_id == base_source)
        .ok_or_else(|| CatalogError::MissingBaseSource(base_source.to_string()))?;

    let base_keys = normalized_keys(base);
    let mut all_keys = base_keys.clone();
    let mut mapping: HashMap<String, String> = HashMap::new();
    let mut merged = 0usize;

    for source in sources.iter().filter(|s| s.source_id != base_source) {
        for key in normalized_keys(source) {
            let best = base_keys
                .iter()
                .map(|base_key| (category_similarity(&key, base_key), base_key))
                .max_by_key(|(score, _)| *score);

            match best {
                Some((score, base_key)) if score >= merge_threshold => {
                    debug!(
                        source = %source.source_id,
                        from = %key,
                        to = %base_key,
                        score,
                        "category merged onto base taxonomy"
                    );
                    mapping.insert(key, base_key.clone());
                    merged += 1;
                }
                _ => {
                    mapping.insert(key.clone(), key.clone());
                    all_keys.insert(key);
                }
            }
        }
    }

    if all_keys.is_empty() {
        return Err(CatalogError::EmptyCanonicalCategorySet);
    }

    let canonical = all_keys
        .iter()
        .map(|key| CanonicalCategory {
            key: key.clone(),
            display_name: display_name_for(key, sources, base_source, &mapping),
        })
        .collect();

    let catalog = CategoryCatalog { canonical, mapping };
    info!(
        base = base_keys.len(),
        merged,
        total = catalog.canonical.len(),
        "canonical category set built"
    );
    Ok(catalog)
}

/// First non-empty raw label whose canonical key matches, preferring
/// non-base sources, then the base source, then a title-cased key.
fn display_name_for(
    key: &str,
    sources: &[SourceRecords],
    base_source: &str,
    mapping: &HashMap<String, String>,
) -> String {
    let scan = |source: &SourceRecords, use_mapping: bool| -> Option<String> {
        source.records.iter().find_map(|record| {
            let record_key = normalize_category(&record.raw_category);
            if record_key.is_empty() || record.raw_category.trim().is_empty() {
                return None;
            }
            let canonical = if use_mapping {
                mapping.get(&record_key).map(String::as_str).unwrap_or(&record_key)
            } else {
                &record_key
            };
            (canonical == key).then(|| record.raw_category.clone())
        })
    };

    for source in sources.iter().filter(|s| s.source_id != base_source) {
        if let Some(name) = scan(source, true) {
            return name;
        }
    }
    for source in sources.iter().filter(|s| s.source_id == base_source) {
        if let Some(name) = scan(source, false) {
            return name;
        }
    }
    title_case(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;

    fn record(source: &str, category: &str, name: &str) -> RawRecord {
        RawRecord {
            raw_category: category.to_string(),
            name: name.to_string(),
            price: "10.0".to_string(),
            source_url: format!("https://{source}.example/{name}"),
            source_id: source.to_string(),
        }
    }

    fn two_sources(base_cats: &[&str], other_cats: &[&str]) -> Vec<SourceRecords> {
        let base_records = base_cats
            .iter()
            .enumerate()
            .map(|(i, c)| record("okey", c, &format!("товар{i}")))
            .collect();
        let other_records = other_cats
            .iter()
            .enumerate()
            .map(|(i, c)| record("svetofor", c, &format!("товар{i}")))
            .collect();
        vec![
            SourceRecords::new("okey", "Окей", base_records),
            SourceRecords::new("svetofor", "Светофор", other_records),
        ]
    }

    #[test]
    fn test_identical_categories_merge() {
        let sources = two_sources(&["Хлеб и выпечка"], &["хлеб, и выпечка!"]);
        let catalog =
            build_canonical_categories(&sources, "okey", DEFAULT_MERGE_THRESHOLD).unwrap();

        assert_eq!(catalog.canonical.len(), 1);
        assert_eq!(catalog.canonical_key("хлеб и выпечка"), "хлеб и выпечка");
    }

    #[test]
    fn test_distant_category_becomes_new_canonical() {
        let sources = two_sources(&["напитки безалкогольные"], &["Напитки, соки"]);
        let catalog =
            build_canonical_categories(&sources, "okey", DEFAULT_MERGE_THRESHOLD).unwrap();

        // "напитки соки" scores 53 against the base category, below the
        // merge threshold, so it keeps its own identity and its display
        // name comes from the non-base raw label.
        assert_eq!(catalog.canonical.len(), 2);
        assert_eq!(catalog.canonical_key("напитки соки"), "напитки соки");
        let new = catalog
            .canonical
            .iter()
            .find(|c| c.key == "напитки соки")
            .unwrap();
        assert_eq!(new.display_name, "Напитки, соки");
    }

    #[test]
    fn test_close_category_maps_onto_base() {
        let sources = two_sources(&["молочные продукты"], &["Молочные продукты / Сыры"]);
        let catalog =
            build_canonical_categories(&sources, "okey", DEFAULT_MERGE_THRESHOLD).unwrap();

        assert_eq!(catalog.canonical.len(), 1);
        assert_eq!(
            catalog.canonical_key("молочные продукты"),
            "молочные продукты"
        );
    }

    #[test]
    fn test_base_key_is_its_own_canonical_form() {
        let sources = two_sources(&["бакалея"], &[]);
        let catalog =
            build_canonical_categories(&sources, "okey", DEFAULT_MERGE_THRESHOLD).unwrap();
        assert_eq!(catalog.canonical_key("бакалея"), "бакалея");
    }

    #[test]
    fn test_missing_base_source_is_fatal() {
        let sources = two_sources(&["бакалея"], &[]);
        let err = build_canonical_categories(&sources, "nosuch", DEFAULT_MERGE_THRESHOLD)
            .unwrap_err();
        assert!(matches!(err, CatalogError::MissingBaseSource(_)));
    }

    #[test]
    fn test_empty_canonical_set_is_fatal() {
        let sources = two_sources(&["!!!", "   "], &["---"]);
        let err = build_canonical_categories(&sources, "okey", DEFAULT_MERGE_THRESHOLD)
            .unwrap_err();
        assert!(matches!(err, CatalogError::EmptyCanonicalCategorySet));
    }

    #[test]
    fn test_display_name_prefers_non_base_raw_label() {
        let sources = two_sources(&["Хлеб и выпечка"], &["хлеб, и выпечка"]);
        let catalog =
            build_canonical_categories(&sources, "okey", DEFAULT_MERGE_THRESHOLD).unwrap();

        assert_eq!(catalog.canonical.len(), 1);
        assert_eq!(catalog.canonical[0].display_name, "хлеб, и выпечка");
    }
}
