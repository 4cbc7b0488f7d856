mod category_repository;
mod product_repository;
mod store_repository;

pub use category_repository::{CategoryRepository, SqliteCategoryRepository};
pub use product_repository::{ProductRepository, SqliteProductRepository};
pub use store_repository::{SqliteStoreRepository, StoreRepository};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn save(&self, entity: &Self::Entity) -> Result<()>;
    fn delete(&self, id: &Self::Id) -> Result<bool>;
}
