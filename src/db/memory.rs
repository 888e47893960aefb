use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProductStore, UserStore};
use crate::error::{AppError, AppResult, Resource};
use crate::models::{NewProduct, Product, ProductChanges, StockMovement, User, UserDocument};

/// In-process store used by the test suite. Each write holds the map's write
/// lock for its whole check-and-set, which gives the same atomicity as the
/// conditional UPDATE in [`super::PgStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn fetch_all_products(&self) -> AppResult<Vec<Product>> {
        let products: Vec<Product> = self.products.read().await.values().cloned().collect();
        Ok(newest_first(products, |p| p.created_at))
    }

    async fn fetch_product(&self, id: Uuid) -> AppResult<Product> {
        self.products
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound(Resource::Product))
    }

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or(AppError::NotFound(Resource::Product))?;
        changes.apply_to(product);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<Product> {
        self.products
            .write()
            .await
            .remove(&id)
            .ok_or(AppError::NotFound(Resource::Product))
    }

    async fn adjust_stock(&self, id: Uuid, movement: StockMovement) -> AppResult<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or(AppError::NotFound(Resource::Product))?;
        product.stock = movement.apply(product.stock)?;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn fetch_all_users(&self) -> AppResult<Vec<User>> {
        let users: Vec<User> = self.users.read().await.values().cloned().collect();
        Ok(newest_first(users, |u| u.created_at))
    }

    async fn fetch_user(&self, id: Uuid) -> AppResult<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound(Resource::User))
    }

    async fn insert_user(&self, document: UserDocument) -> AppResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            fields: document.0,
            created_at: now,
            updated_at: now,
        };
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, document: UserDocument) -> AppResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or(AppError::NotFound(Resource::User))?;
        document.merge_into(&mut user.fields);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<User> {
        self.users
            .write()
            .await
            .remove(&id)
            .ok_or(AppError::NotFound(Resource::User))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdjustInventory;

    fn widget(stock: i64) -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            description: "Pieza de prueba".to_string(),
            price: 2.5,
            stock,
        }
    }

    fn outbound(quantity: i64, min_stock: i64) -> StockMovement {
        StockMovement::try_from(AdjustInventory {
            kind: Some("salida".to_string()),
            quantity: Some(quantity.into()),
            min_stock: Some(min_stock.into()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn insert_then_fetch_returns_same_record() {
        let store = MemoryStore::new();
        let created = store.insert_product(widget(4)).await.unwrap();
        let fetched = store.fetch_product(created.id).await.unwrap();
        assert_eq!(created, fetched);
    }

    #[tokio::test]
    async fn rejected_outbound_leaves_stock_untouched() {
        let store = MemoryStore::new();
        let created = store.insert_product(widget(10)).await.unwrap();

        let err = store
            .adjust_stock(created.id, outbound(6, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));

        let fetched = store.fetch_product(created.id).await.unwrap();
        assert_eq!(fetched.stock, 10);
        assert_eq!(fetched.updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn adjust_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let movement = StockMovement::try_from(AdjustInventory {
            kind: Some("entrada".to_string()),
            quantity: Some(1.into()),
            min_stock: None,
        })
        .unwrap();
        let err = store.adjust_stock(Uuid::new_v4(), movement).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Resource::Product)));
    }

    #[tokio::test]
    async fn concurrent_outbound_movements_respect_the_floor() {
        let store = MemoryStore::new();
        let id = store.insert_product(widget(10)).await.unwrap().id;

        // Each movement alone would pass against stock 10; only one may win.
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.adjust_stock(id, outbound(6, 0)).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(store.fetch_product(id).await.unwrap().stock, 4);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStore::new();
        let first = store.insert_product(widget(1)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = store.insert_product(widget(2)).await.unwrap();

        let ids: Vec<Uuid> = store
            .fetch_all_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn delete_user_returns_removed_record() {
        let store = MemoryStore::new();
        let user = store.insert_user(UserDocument::default()).await.unwrap();
        assert_eq!(store.delete_user(user.id).await.unwrap(), user);
        assert!(matches!(
            store.fetch_user(user.id).await,
            Err(AppError::NotFound(Resource::User))
        ));
    }
}
