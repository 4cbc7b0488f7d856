use serde::{Deserialize, Serialize};

/// One consolidated listing. `store_id` and `category_id` are
/// non-owning references into the Store/Category sets built by the
/// same consolidation pass. The price is a point-in-time value, not a
/// time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub store_id: i64,
    pub category_id: i64,
}

impl Product {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        price: f64,
        store_id: i64,
        category_id: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            store_id,
            category_id,
        }
    }
}
