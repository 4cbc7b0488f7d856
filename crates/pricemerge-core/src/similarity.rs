//! Similarity scoring between normalized keys.
//!
//! A score is an integer in `[0, 100]`. The pair score is the maximum
//! over several complementary metrics so that reorderings, repeated
//! words and partial overlaps are all caught by at least one of them.
//! Inputs are expected to already be normalized keys (see
//! [`crate::normalize::normalize`]); callers that hold raw names must
//! normalize first.

use std::collections::{BTreeSet, HashMap};

/// Find the longest matching block between `a[alo..ahi]` and
/// `b[blo..bhi]`, returning `(i, j, len)`. Ties are broken by the
/// earliest position in `a`, then in `b`, so block selection is
/// deterministic for a given argument order.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate().take(bhi).skip(blo) {
        b_index.entry(*c).or_default().push(j);
    }

    let mut best = (alo, blo, 0usize);
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for i in alo..ahi {
        let mut new_runs: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b_index.get(&a[i]) {
            for &j in positions {
                let k = if j > blo {
                    run_lengths.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                new_runs.insert(j, k);
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        run_lengths = new_runs;
    }

    best
}

/// Collect all matching blocks (greedy, longest-first recursion).
fn collect_blocks(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
    out: &mut Vec<(usize, usize, usize)>,
) {
    let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
    if k > 0 {
        collect_blocks(a, b, alo, i, blo, j, out);
        out.push((i, j, k));
        collect_blocks(a, b, i + k, ahi, j + k, bhi, out);
    }
}

fn ratio_chars(a: &[char], b: &[char]) -> u32 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }

    let mut blocks = Vec::new();
    collect_blocks(a, b, 0, a.len(), 0, b.len(), &mut blocks);
    let matched: usize = blocks.iter().map(|&(_, _, k)| k).sum();

    ((200 * matched) as f64 / total as f64).round() as u32
}

/// Character-level alignment similarity: `100 * 2M / (len a + len b)`
/// where `M` is the total length of the greedily matched blocks.
pub fn ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best [`ratio`] of the shorter string against every block-aligned
/// same-length window of the longer one.
///
/// NOT symmetric: the roles of "needle" and "haystack" depend on the
/// argument lengths, and when the lengths are equal the FIRST argument
/// takes the needle role. Callers that need reproducible clustering
/// must pass the anchor as the first argument.
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let ac: Vec<char> = a.chars().collect();
    let bc: Vec<char> = b.chars().collect();

    let (needle, hay) = if ac.len() <= bc.len() {
        (&ac, &bc)
    } else {
        (&bc, &ac)
    };
    if needle.is_empty() {
        return 0;
    }

    let mut blocks = Vec::new();
    collect_blocks(needle, hay, 0, needle.len(), 0, hay.len(), &mut blocks);
    // The trailing alignment (needle against the tail of the haystack)
    // is considered even when no block lands there.
    blocks.push((needle.len(), hay.len(), 0));

    let mut best = 0u32;
    for (i, j, _) in blocks {
        let start = j.saturating_sub(i).min(hay.len() - needle.len());
        let window = &hay[start..start + needle.len()];
        let score = ratio_chars(needle, window);
        if score == 100 {
            return 100;
        }
        best = best.max(score);
    }
    best
}

fn sorted_join(tokens: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    let mut tokens: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();
    tokens.sort();
    tokens.join(" ")
}

/// [`ratio`] over the alphabetically sorted token strings; robust to
/// word order.
pub fn token_sort_ratio(a: &str, b: &str) -> u32 {
    ratio(
        &sorted_join(a.split_whitespace()),
        &sorted_join(b.split_whitespace()),
    )
}

/// [`ratio`] of the sorted token intersection against the sorted token
/// union; robust to reordering and repeated words.
pub fn token_set_ratio(a: &str, b: &str) -> u32 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();

    let intersection = sorted_join(set_a.intersection(&set_b));
    let union = sorted_join(set_a.union(&set_b));
    ratio(&intersection, &union)
}

/// Pair score for product names: the maximum of all four metrics.
///
/// Returns 0 if either key is empty. Because [`partial_ratio`] is
/// asymmetric, pass the clustering anchor as the first argument.
pub fn similarity(a: &str, b: &str) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    [
        ratio(a, b),
        token_set_ratio(a, b),
        token_sort_ratio(a, b),
        partial_ratio(a, b),
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
}

/// Pair score for category labels.
///
/// Partial ratio is excluded here: category labels are short and a
/// shared word like "товары" would otherwise merge unrelated branches
/// of the taxonomy.
pub fn category_similarity(a: &str, b: &str) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    [ratio(a, b), token_set_ratio(a, b), token_sort_ratio(a, b)]
        .into_iter()
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_scores_100() {
        for key in ["хлеб", "молоко 1л", "coca cola"] {
            assert_eq!(similarity(key, key), 100);
            assert_eq!(category_similarity(key, key), 100);
        }
    }

    #[test]
    fn test_empty_input_scores_zero() {
        assert_eq!(similarity("", "молоко"), 0);
        assert_eq!(similarity("молоко", ""), 0);
        assert_eq!(similarity("", ""), 0);
    }

    #[test]
    fn test_ratio_counts_matching_blocks() {
        // "молоко 1" (8 chars) + "л" match out of 9 + 11 chars total.
        assert_eq!(ratio("молоко 1л", "молоко 1 5л"), 90);
        assert_eq!(ratio("abcd", "wxyz"), 0);
    }

    #[test]
    fn test_token_sort_handles_reordering() {
        assert_eq!(token_sort_ratio("хлеб белый", "белый хлеб"), 100);
    }

    #[test]
    fn test_token_set_handles_repeated_words() {
        assert_eq!(
            token_set_ratio("молоко молоко свежее", "свежее молоко"),
            100
        );
    }

    #[test]
    fn test_partial_matches_substring() {
        assert_eq!(partial_ratio("сок", "сок яблочный"), 100);
    }

    #[test]
    fn test_similarity_is_max_of_metrics() {
        let score = similarity("молоко 1л", "молоко 1 5л");
        assert_eq!(score, 90);
        assert!(score >= ratio("молоко 1л", "молоко 1 5л"));
    }

    #[test]
    fn test_category_similarity_excludes_partial() {
        // "сыр" aligns perfectly as a substring, so the product scorer
        // saturates while the category scorer does not.
        let a = "сыр";
        let b = "сыр колбасный плавленый копчёный";
        assert_eq!(similarity(a, b), 100);
        assert!(category_similarity(a, b) < 100);
    }

    #[test]
    fn test_distant_categories_stay_below_merge_threshold() {
        let score = category_similarity("напитки соки", "напитки безалкогольные");
        assert_eq!(score, 53);
    }
}
