use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{ProductStore, UserStore};
use crate::error::{AppError, AppResult, Resource};
use crate::models::{
    NewProduct, Product, ProductChanges, StockMovement, User, UserDocument, UserFields,
};

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, created_at, updated_at";
const USER_COLUMNS: &str = "id, document, created_at, updated_at";

/// PostgreSQL-backed store. Products are a typed table; users are JSONB
/// documents since their schema is not owned here.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    document: Json<UserFields>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            fields: row.document.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ── Products ──────────────────────────────────────────────────────────────────

#[async_trait]
impl ProductStore for PgStore {
    async fn fetch_all_products(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM productos ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn fetch_product(&self, id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM productos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound(Resource::Product))
    }

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO productos (name, description, price, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product> {
        let mut tx = self.pool.begin().await?;
        let mut product = lock_product(&mut tx, id).await?;
        changes.apply_to(&mut product);
        let product = write_product(&mut tx, &product).await?;
        tx.commit().await?;

        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "DELETE FROM productos WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound(Resource::Product))
    }

    async fn adjust_stock(&self, id: Uuid, movement: StockMovement) -> AppResult<Product> {
        // The row stays locked until commit, so two concurrent outbound
        // movements cannot both pass against the same stale stock.
        let mut tx = self.pool.begin().await?;
        let mut product = lock_product(&mut tx, id).await?;

        product.stock = match movement.apply(product.stock) {
            Ok(stock) => stock,
            Err(err) => {
                debug!(id = %id, stock = product.stock, "Inventory movement refused");
                return Err(err);
            }
        };

        let product = write_product(&mut tx, &product).await?;
        tx.commit().await?;

        Ok(product)
    }
}

/// Reads a product and holds its row lock for the rest of the transaction.
async fn lock_product(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<Product> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM productos WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::NotFound(Resource::Product))
}

async fn write_product(
    tx: &mut Transaction<'_, Postgres>,
    product: &Product,
) -> AppResult<Product> {
    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE productos
        SET name        = $2,
            description = $3,
            price       = $4,
            stock       = $5,
            updated_at  = now()
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.stock)
    .fetch_one(&mut **tx)
    .await?;

    Ok(product)
}

// ── Users ─────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserStore for PgStore {
    async fn fetch_all_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM usuarios ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn fetch_user(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM usuarios WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::from)
        .ok_or(AppError::NotFound(Resource::User))
    }

    async fn insert_user(&self, document: UserDocument) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO usuarios (document) VALUES ($1) RETURNING {USER_COLUMNS}"
        ))
        .bind(Json(document.0))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_user(&self, id: Uuid, document: UserDocument) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM usuarios WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound(Resource::User))?;

        let mut fields = row.document.0;
        document.merge_into(&mut fields);

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE usuarios
            SET document = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Json(fields))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(row.into())
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            "DELETE FROM usuarios WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::from)
        .ok_or(AppError::NotFound(Resource::User))
    }
}
