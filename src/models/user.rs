use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Free-form user attributes. The user schema is owned by whoever writes the
/// records, so this service stores whatever top-level fields it is given.
pub type UserFields = serde_json::Map<String, Value>;

/// Keys the store owns; clients cannot set them.
const RESERVED_KEYS: &[&str] = &["id", "_id", "createdAt", "updatedAt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: UserFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A JSON object body with the store-owned keys removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDocument(pub UserFields);

impl TryFrom<Value> for UserDocument {
    type Error = AppError;

    fn try_from(body: Value) -> AppResult<Self> {
        let Value::Object(mut fields) = body else {
            return Err(AppError::Validation(
                "El cuerpo de la petición debe ser un objeto JSON".to_string(),
            ));
        };
        for key in RESERVED_KEYS {
            fields.remove(*key);
        }
        Ok(Self(fields))
    }
}

impl UserDocument {
    /// Top-level merge: keys present in `self` replace the stored ones.
    pub fn merge_into(self, fields: &mut UserFields) {
        fields.extend(self.0);
    }
}
