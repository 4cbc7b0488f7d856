use serde::{Deserialize, Serialize};

/// One canonical category shared across sources.
///
/// `canonical_name` is a chosen display string (usually a raw category
/// label from one of the sources), not the normalized key itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub canonical_name: String,
}

impl Category {
    pub fn new(id: i64, canonical_name: impl Into<String>) -> Self {
        Self {
            id,
            canonical_name: canonical_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_json_roundtrip() {
        let category = Category::new(3, "Напитки, соки");
        let json = serde_json::to_string(&category).unwrap();
        let restored: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, category);
    }
}
