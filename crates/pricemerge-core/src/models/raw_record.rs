use serde::{Deserialize, Serialize};

/// One raw listing as produced by a scraper, before any consolidation.
///
/// The price is kept as raw text: source tables are not trusted to
/// hold parseable numbers, and unparseable rows are skipped during
/// ingestion rather than rejected at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub raw_category: String,
    pub name: String,
    pub price: String,
    pub source_url: String,
    pub source_id: String,
}

/// All raw records of one source, paired with the source identity the
/// pipeline turns into a Store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecords {
    pub source_id: String,
    pub display_name: String,
    pub records: Vec<RawRecord>,
}

impl SourceRecords {
    pub fn new(
        source_id: impl Into<String>,
        display_name: impl Into<String>,
        records: Vec<RawRecord>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            display_name: display_name.into(),
            records,
        }
    }
}
