use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use uuid::Uuid;

use super::whole_number;
use crate::error::{AppError, AppResult};

/// Core product entity. Field names on the wire follow the public API
/// (`nombre`, `descripcion`, `precio`, `stock`, `createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "precio")]
    pub price: f64,
    /// Never negative.
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Request payloads ─────────────────────────────────────────────────────────

/// Raw create body. Every field is optional here so that a missing field is
/// reported by [`NewProduct::try_from`] with a readable message.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProduct {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "precio")]
    pub price: Option<f64>,
    pub stock: Option<Number>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProduct {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "precio")]
    pub price: Option<f64>,
    pub stock: Option<Number>,
}

// ── Validated inputs ─────────────────────────────────────────────────────────

/// A product that passed every field constraint and can be inserted as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
}

impl TryFrom<CreateProduct> for NewProduct {
    type Error = AppError;

    fn try_from(payload: CreateProduct) -> AppResult<Self> {
        Ok(Self {
            name: text("nombre", required("nombre", payload.name)?)?,
            description: text("descripcion", required("descripcion", payload.description)?)?,
            price: price(required("precio", payload.price)?)?,
            stock: stock(&required("stock", payload.stock)?)?,
        })
    }
}

/// Partial replacement of product fields; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

impl TryFrom<UpdateProduct> for ProductChanges {
    type Error = AppError;

    fn try_from(payload: UpdateProduct) -> AppResult<Self> {
        Ok(Self {
            name: payload.name.map(|v| text("nombre", v)).transpose()?,
            description: payload
                .description
                .map(|v| text("descripcion", v))
                .transpose()?,
            price: payload.price.map(price).transpose()?,
            stock: payload.stock.as_ref().map(stock).transpose()?,
        })
    }
}

impl ProductChanges {
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

fn required<T>(field: &str, value: Option<T>) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("El campo '{field}' es obligatorio")))
}

fn text(field: &str, value: String) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!(
            "El campo '{field}' no puede estar vacío"
        )));
    }
    Ok(trimmed.to_string())
}

fn price(value: f64) -> AppResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(
            "El campo 'precio' debe ser un número mayor o igual a 0".to_string(),
        ));
    }
    Ok(value)
}

fn stock(value: &Number) -> AppResult<i64> {
    let value = whole_number("stock", value)?;
    if value < 0 {
        return Err(AppError::Validation(
            "El campo 'stock' debe ser mayor o igual a 0".to_string(),
        ));
    }
    Ok(value)
}
