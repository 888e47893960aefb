use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, warn};

use super::{optional_json, parse_id, reply, ApiJson, Reply};
use crate::{
    error::{AppError, Resource},
    models::{
        AdjustInventory, CreateProduct, NewProduct, Product, ProductChanges, StockMovement,
        UpdateProduct,
    },
    AppState,
};

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(State(state): State<AppState>) -> Reply<Vec<Product>> {
    let products = state.products.fetch_all_products().await?;
    info!(count = products.len(), "Listed products");
    reply(StatusCode::OK, products)
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> Reply<Product> {
    let id = parse_id(&id, Resource::Product)?;
    let product = state.products.fetch_product(id).await?;
    reply(StatusCode::OK, product)
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateProduct>,
) -> Reply<Product> {
    let new_product = NewProduct::try_from(payload)?;
    let product = state.products.insert_product(new_product).await?;

    info!(id = %product.id, name = %product.name, "Created product");
    reply(StatusCode::CREATED, product)
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Reply<Product> {
    let id = parse_id(&id, Resource::Product)?;
    let changes = match optional_json::<UpdateProduct>(&body)
        .and_then(|payload| ProductChanges::try_from(payload.unwrap_or_default()))
    {
        Ok(changes) => changes,
        // An unknown id wins over a bad body.
        Err(err) => {
            state.products.fetch_product(id).await?;
            return Err(err);
        }
    };
    let product = state.products.update_product(id, changes).await?;

    info!(id = %id, "Updated product");
    reply(StatusCode::OK, product)
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Reply<Product> {
    let id = parse_id(&id, Resource::Product)?;
    let product = state.products.delete_product(id).await?;

    info!(id = %id, "Deleted product");
    reply(StatusCode::OK, product)
}

// ── Inventory ─────────────────────────────────────────────────────────────────

pub async fn adjust_inventory(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<AdjustInventory>,
) -> Reply<Product> {
    // Body first: an unknown `tipo` is a 400 even when the id is unknown too.
    let movement = StockMovement::try_from(payload)?;
    let id = parse_id(&id, Resource::Product)?;

    let product = match state.products.adjust_stock(id, movement).await {
        Ok(product) => product,
        Err(err @ AppError::InsufficientStock { .. }) => {
            warn!(id = %id, kind = %movement.kind, error = %err, "Inventory movement refused");
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    info!(
        id = %id,
        kind = %movement.kind,
        quantity = movement.quantity,
        stock = product.stock,
        "Adjusted inventory"
    );
    reply(StatusCode::OK, product)
}
