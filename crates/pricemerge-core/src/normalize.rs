//! Text canonicalization used by every matching component.
//!
//! A normalized key is the lowercase, alphanumeric-only,
//! whitespace-collapsed form of a name. Two names refer to the same
//! key iff their normalized forms are character-identical.

/// Characters that survive normalization: Latin and Cyrillic
/// alphanumerics (lowercase, including `ё`).
fn keeps(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || ('а'..='я').contains(&c) || c == 'ё'
}

/// Normalize a product or category name into its matching key.
///
/// Lowercases, replaces every run of non-alphanumeric characters with a
/// single space, collapses whitespace and trims. Empty input yields an
/// empty string; callers must treat empty keys as unmatched.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut gap = false;

    for c in lower.chars() {
        if keeps(c) {
            if gap && !out.is_empty() {
                out.push(' ');
            }
            gap = false;
            out.push(c);
        } else {
            gap = true;
        }
    }

    out
}

/// Normalize a raw category label.
///
/// Categories are often slash-delimited hierarchical paths
/// ("Молочные продукты / Сыры"); only the top segment is used.
pub fn normalize_category(text: &str) -> String {
    let top = text.split('/').next().unwrap_or("");
    normalize(&top.replace(',', " "))
}

/// Title-case a normalized key for display, used as the fallback when
/// no raw category string is available.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_and_punctuation_insensitive() {
        assert_eq!(normalize("Хлеб!!"), normalize("хлеб"));
        assert_eq!(normalize("Молоко 3,2%"), "молоко 3 2");
        assert_eq!(normalize("Coca-Cola 0.5L"), "coca cola 0 5l");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  сыр   твёрдый  "), "сыр твёрдый");
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in ["Хлеб Бородинский!", "  a--b  ", "Напитки, соки", ""] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!! ---"), "");
    }

    #[test]
    fn test_normalize_category_takes_top_segment() {
        assert_eq!(
            normalize_category("Молочные продукты / Сыры"),
            "молочные продукты"
        );
    }

    #[test]
    fn test_normalize_category_strips_commas() {
        assert_eq!(normalize_category("Напитки, соки"), "напитки соки");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("напитки соки"), "Напитки Соки");
        assert_eq!(title_case(""), "");
    }
}
