mod category;
mod product;
mod raw_record;
mod store;

pub use category::Category;
pub use product::Product;
pub use raw_record::{RawRecord, SourceRecords};
pub use store::Store;
