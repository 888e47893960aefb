use std::{fmt, str::FromStr};

use serde::Deserialize;
use serde_json::Number;

use super::whole_number;
use crate::error::{AppError, AppResult};

/// Direction of an inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    /// `entrada`: stock comes in, always accepted.
    Inbound,
    /// `salida`: stock goes out, guarded by the floor.
    Outbound,
}

impl FromStr for MovementKind {
    type Err = AppError;

    fn from_str(raw: &str) -> AppResult<Self> {
        match raw {
            "entrada" => Ok(Self::Inbound),
            "salida" => Ok(Self::Outbound),
            _ => Err(invalid_kind()),
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inbound => "entrada",
            Self::Outbound => "salida",
        })
    }
}

fn invalid_kind() -> AppError {
    AppError::Validation("El tipo debe ser 'entrada' o 'salida'".to_string())
}

/// Raw body of `PATCH /api/productos/{id}/inventario`.
#[derive(Debug, Default, Deserialize)]
pub struct AdjustInventory {
    #[serde(rename = "tipo")]
    pub kind: Option<String>,
    #[serde(rename = "cantidad")]
    pub quantity: Option<Number>,
    #[serde(rename = "stockMinimo")]
    pub min_stock: Option<Number>,
}

/// A validated movement, ready to be applied against a stored stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    pub kind: MovementKind,
    pub quantity: i64,
    pub min_stock: i64,
}

impl TryFrom<AdjustInventory> for StockMovement {
    type Error = AppError;

    /// `tipo` is checked before anything else so an unknown kind is always a 400.
    fn try_from(payload: AdjustInventory) -> AppResult<Self> {
        let kind: MovementKind = payload.kind.as_deref().ok_or_else(invalid_kind)?.parse()?;

        let quantity = payload.quantity.as_ref().ok_or_else(|| {
            AppError::Validation("El campo 'cantidad' es obligatorio".to_string())
        })?;
        let quantity = whole_number("cantidad", quantity)?;
        if quantity < 0 {
            return Err(AppError::Validation(
                "El campo 'cantidad' debe ser mayor o igual a 0".to_string(),
            ));
        }

        Ok(Self {
            kind,
            quantity,
            min_stock: payload
                .min_stock
                .as_ref()
                .map(|n| whole_number("stockMinimo", n))
                .transpose()?
                .unwrap_or(0),
        })
    }
}

impl StockMovement {
    /// Lowest stock an outbound movement may leave behind. Clamped at zero so
    /// a negative `stockMinimo` can never drive stock below zero.
    pub fn floor(&self) -> i64 {
        self.min_stock.max(0)
    }

    /// Stock level after applying this movement to `current`, or the reason
    /// it was refused. Pure: callers decide how to persist the result.
    pub fn apply(&self, current: i64) -> AppResult<i64> {
        match self.kind {
            MovementKind::Inbound => current.checked_add(self.quantity).ok_or_else(|| {
                AppError::Internal(format!("stock overflow: {current} + {}", self.quantity))
            }),
            MovementKind::Outbound => match current.checked_sub(self.quantity) {
                Some(remaining) if remaining >= self.floor() => Ok(remaining),
                _ => Err(AppError::InsufficientStock {
                    available: current,
                    requested: self.quantity,
                    floor: self.floor(),
                }),
            },
        }
    }
}
