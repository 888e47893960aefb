//! Persistence seam. Handlers only see these traits; `main` injects a
//! [`PgStore`] and the tests inject a `MemoryStore`.

#[cfg(test)]
mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewProduct, Product, ProductChanges, StockMovement, User, UserDocument};

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Newest first.
    async fn fetch_all_products(&self) -> AppResult<Vec<Product>>;

    async fn fetch_product(&self, id: Uuid) -> AppResult<Product>;

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product>;

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product>;

    /// Returns the record as it was before removal.
    async fn delete_product(&self, id: Uuid) -> AppResult<Product>;

    /// Applies `movement` as one atomic check-and-write: either the new stock
    /// is persisted or the stored record is left untouched.
    async fn adjust_stock(&self, id: Uuid, movement: StockMovement) -> AppResult<Product>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn fetch_all_users(&self) -> AppResult<Vec<User>>;

    async fn fetch_user(&self, id: Uuid) -> AppResult<User>;

    async fn insert_user(&self, document: UserDocument) -> AppResult<User>;

    /// Merges the document's top-level keys into the stored ones.
    async fn update_user(&self, id: Uuid, document: UserDocument) -> AppResult<User>;

    async fn delete_user(&self, id: Uuid) -> AppResult<User>;
}
