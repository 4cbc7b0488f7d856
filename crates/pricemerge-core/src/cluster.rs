//! Per-category product grouping.
//!
//! Given one category's products across all stores, partitions them
//! into exact multi-store matches, fuzzy-similar groups, and unique
//! items. The result is ephemeral: it is recomputed every time a
//! category is viewed and never persisted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{Product, Store};
use crate::normalize::normalize;
use crate::similarity::similarity;

/// Half-open acceptance interval for fuzzy grouping.
///
/// A pair scoring in `[similar_min, similar_max)` is "same product,
/// fuzzy spelling". Scores at or above `similar_max` are deliberately
/// excluded: near-identical names are already caught by exact grouping
/// and must not be re-merged through a second code path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusterThresholds {
    pub similar_min: u32,
    pub similar_max: u32,
}

impl Default for ClusterThresholds {
    fn default() -> Self {
        Self {
            similar_min: 50,
            similar_max: 95,
        }
    }
}

impl ClusterThresholds {
    fn accepts(&self, score: u32) -> bool {
        self.similar_min <= score && score < self.similar_max
    }
}

/// One group of products judged to be the same item across sources.
#[derive(Debug, Clone, Serialize)]
pub struct ProductGroup {
    pub display_name: String,
    pub members: Vec<Product>,
    pub stores_present: BTreeSet<String>,
    pub by_store: BTreeMap<String, Vec<Product>>,
}

/// Clustering result for one category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryView {
    pub exact_multi_store: Vec<ProductGroup>,
    pub similar: Vec<ProductGroup>,
    pub unique: Vec<Product>,
}

fn store_name(stores: &HashMap<i64, Store>, id: i64) -> String {
    stores
        .get(&id)
        .map(|s| s.display_name.clone())
        .unwrap_or_else(|| format!("store #{id}"))
}

fn build_group(display_name: String, members: Vec<Product>, stores: &HashMap<i64, Store>) -> ProductGroup {
    let mut stores_present = BTreeSet::new();
    let mut by_store: BTreeMap<String, Vec<Product>> = BTreeMap::new();
    for product in &members {
        let name = store_name(stores, product.store_id);
        stores_present.insert(name.clone());
        by_store.entry(name).or_default().push(product.clone());
    }
    ProductGroup {
        display_name,
        members,
        stores_present,
        by_store,
    }
}

/// Group one category's products.
///
/// The algorithm is total over any finite product list; an empty input
/// yields an all-empty view.
///
/// Fuzzy grouping is anchor-based single-link: each candidate is
/// compared only against the original anchor name, never against names
/// already added to the growing group. This is deliberately
/// non-transitive (A~B and B~C does not pull C into A's group unless
/// C also matches A) and must not be "fixed" into transitive closure,
/// which would change visible grouping.
pub fn cluster_category(
    products: &[Product],
    stores: &HashMap<i64, Store>,
    thresholds: ClusterThresholds,
) -> CategoryView {
    // 1. Exact partition by normalized name, first-seen order.
    let mut partition_of: HashMap<String, usize> = HashMap::new();
    let mut partitions: Vec<Vec<usize>> = Vec::new();
    for (idx, product) in products.iter().enumerate() {
        let key = normalize(&product.name);
        let slot = *partition_of.entry(key).or_insert_with(|| {
            partitions.push(Vec::new());
            partitions.len() - 1
        });
        partitions[slot].push(idx);
    }

    let mut view = CategoryView::default();
    let mut pool: Vec<usize> = Vec::new();

    for members in &partitions {
        let distinct_stores: BTreeSet<i64> =
            members.iter().map(|&i| products[i].store_id).collect();
        if distinct_stores.len() >= 2 {
            let group_members: Vec<Product> =
                members.iter().map(|&i| products[i].clone()).collect();
            let display_name = group_members[0].name.clone();
            view.exact_multi_store
                .push(build_group(display_name, group_members, stores));
        } else {
            pool.extend(members.iter().copied());
        }
    }

    // 2. Deterministic ordering: the sort key fixes which products act
    //    as anchors, so the same input list always yields the same
    //    groups despite non-transitive similarity.
    let keys: Vec<String> = pool.iter().map(|&i| normalize(&products[i].name)).collect();
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by(|&x, &y| keys[x].cmp(&keys[y]));

    // 3. Anchor-based greedy pass with one assignment slot per product.
    let mut assigned_to: Vec<Option<usize>> = vec![None; pool.len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (pos, &slot) in order.iter().enumerate() {
        if assigned_to[slot].is_some() {
            continue;
        }
        let group_id = groups.len();
        let mut members = vec![slot];
        let anchor_key = &keys[slot];

        for &candidate in &order[pos + 1..] {
            if assigned_to[candidate].is_some() {
                continue;
            }
            let score = similarity(anchor_key, &keys[candidate]);
            if thresholds.accepts(score) {
                assigned_to[candidate] = Some(group_id);
                members.push(candidate);
            }
        }

        if members.len() > 1 {
            assigned_to[slot] = Some(group_id);
            groups.push(members);
        }
    }

    for members in groups {
        let group_members: Vec<Product> = members
            .iter()
            .map(|&slot| products[pool[slot]].clone())
            .collect();

        // Display name: the member with the fewest characters, ties
        // broken by group order (anchor first, then sorted candidates).
        let display_name = group_members
            .iter()
            .min_by_key(|p| p.name.chars().count())
            .map(|p| p.name.clone())
            .unwrap_or_default();

        view.similar
            .push(build_group(display_name, group_members, stores));
    }

    for &slot in &order {
        if assigned_to[slot].is_none() {
            view.unique.push(products[pool[slot]].clone());
        }
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_map(names: &[&str]) -> HashMap<i64, Store> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| (i as i64 + 1, Store::new(i as i64 + 1, *name)))
            .collect()
    }

    fn product(id: i64, name: &str, store_id: i64) -> Product {
        Product::new(id, name, 100.0, store_id, 1)
    }

    #[test]
    fn test_empty_category_yields_empty_view() {
        let view = cluster_category(&[], &HashMap::new(), ClusterThresholds::default());
        assert!(view.exact_multi_store.is_empty());
        assert!(view.similar.is_empty());
        assert!(view.unique.is_empty());
    }

    #[test]
    fn test_exact_match_across_two_stores() {
        let stores = store_map(&["Окей", "Светофор"]);
        let products = vec![
            product(1, "Хлеб Бородинский", 1),
            product(2, "хлеб бородинский", 2),
        ];

        let view = cluster_category(&products, &stores, ClusterThresholds::default());
        assert_eq!(view.exact_multi_store.len(), 1);

        let group = &view.exact_multi_store[0];
        assert_eq!(group.display_name, "Хлеб Бородинский");
        assert_eq!(group.members.len(), 2);
        let expected: BTreeSet<String> =
            ["Окей".to_string(), "Светофор".to_string()].into_iter().collect();
        assert_eq!(group.stores_present, expected);
        assert!(view.similar.is_empty());
        assert!(view.unique.is_empty());
    }

    #[test]
    fn test_exact_match_single_store_is_not_grouped() {
        let stores = store_map(&["Окей"]);
        let products = vec![
            product(1, "Хлеб Бородинский", 1),
            product(2, "хлеб бородинский", 1),
        ];

        let view = cluster_category(&products, &stores, ClusterThresholds::default());
        assert!(view.exact_multi_store.is_empty());
    }

    #[test]
    fn test_similar_group_uses_shortest_name_for_display() {
        let stores = store_map(&["Окей", "Светофор"]);
        let products = vec![
            product(1, "Молоко 1л", 1),
            product(2, "Молоко 1.5л", 2),
        ];

        let view = cluster_category(&products, &stores, ClusterThresholds::default());
        assert!(view.exact_multi_store.is_empty());
        assert_eq!(view.similar.len(), 1);

        let group = &view.similar[0];
        assert_eq!(group.display_name, "Молоко 1л");
        assert_eq!(group.members.len(), 2);
        assert_eq!(group.by_store["Окей"].len(), 1);
        assert_eq!(group.by_store["Светофор"].len(), 1);
        assert!(view.unique.is_empty());
    }

    #[test]
    fn test_threshold_interval_is_half_open() {
        let stores = store_map(&["Окей", "Светофор"]);
        let products = vec![
            product(1, "Молоко 1л", 1),
            product(2, "Молоко 1.5л", 2),
        ];
        // This pair scores exactly 90 (see similarity tests).

        // A score equal to similar_min is included.
        let at_min = cluster_category(
            &products,
            &stores,
            ClusterThresholds { similar_min: 90, similar_max: 95 },
        );
        assert_eq!(at_min.similar.len(), 1);

        // A score equal to similar_max is excluded.
        let at_max = cluster_category(
            &products,
            &stores,
            ClusterThresholds { similar_min: 50, similar_max: 90 },
        );
        assert!(at_max.similar.is_empty());
        assert_eq!(at_max.unique.len(), 2);
    }

    #[test]
    fn test_unrelated_products_stay_unique() {
        let stores = store_map(&["Окей", "Светофор"]);
        let products = vec![
            product(1, "Гречка 900г", 1),
            product(2, "Шампунь детский", 2),
        ];

        let view = cluster_category(&products, &stores, ClusterThresholds::default());
        assert!(view.exact_multi_store.is_empty());
        assert!(view.similar.is_empty());
        assert_eq!(view.unique.len(), 2);
    }

    #[test]
    fn test_clustering_is_deterministic() {
        let stores = store_map(&["Окей", "Светофор"]);
        let products = vec![
            product(1, "Молоко 1л", 1),
            product(2, "Молоко 1.5л", 2),
            product(3, "Хлеб Дарницкий", 1),
            product(4, "хлеб дарницкий", 2),
            product(5, "Кефир 1%", 1),
        ];

        let first = cluster_category(&products, &stores, ClusterThresholds::default());
        let second = cluster_category(&products, &stores, ClusterThresholds::default());

        let render =
            |v: &CategoryView| serde_json::to_string(v).expect("view serializes");
        assert_eq!(render(&first), render(&second));
        assert_eq!(first.exact_multi_store.len(), 1);
        assert_eq!(first.similar.len(), 1);
        assert_eq!(first.unique.len(), 1);
    }

    #[test]
    fn test_anchor_linkage_is_not_transitive() {
        // B matches the anchor A, and C would match B, but C is only
        // ever compared against A and therefore stays out of the group.
        let stores = store_map(&["Окей", "Светофор"]);
        let a = product(1, "Гель для душа", 1);
        let b = product(2, "Гель для стирки", 2);
        let c = product(3, "Порошок для стирки", 2);

        let ab = crate::similarity::similarity(
            &normalize(&a.name),
            &normalize(&b.name),
        );
        let bc = crate::similarity::similarity(
            &normalize(&b.name),
            &normalize(&c.name),
        );
        let ac = crate::similarity::similarity(
            &normalize(&a.name),
            &normalize(&c.name),
        );
        let thresholds = ClusterThresholds::default();
        assert!(thresholds.accepts(ab), "A~B expected in range, got {ab}");
        assert!(thresholds.accepts(bc), "B~C expected in range, got {bc}");
        assert!(!thresholds.accepts(ac), "A~C expected out of range, got {ac}");

        let view = cluster_category(&[a, b, c], &stores, thresholds);
        assert_eq!(view.similar.len(), 1);
        assert_eq!(view.similar[0].members.len(), 2);
        assert_eq!(view.unique.len(), 1);
        assert_eq!(view.unique[0].name, "Порошок для стирки");
    }
}
