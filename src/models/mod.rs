mod envelope;
mod inventory;
mod product;
mod user;

pub use envelope::Envelope;
pub use inventory::{AdjustInventory, StockMovement};
pub use product::{CreateProduct, NewProduct, Product, ProductChanges, UpdateProduct};
pub use user::{User, UserDocument, UserFields};

use serde_json::Number;

use crate::error::{AppError, AppResult};

/// Integer fields accept `5` and `5.0` alike; a fractional part is refused.
fn whole_number(field: &str, value: &Number) -> AppResult<i64> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(f as i64),
        _ => Err(AppError::Validation(format!(
            "El campo '{field}' debe ser un número entero"
        ))),
    }
}
