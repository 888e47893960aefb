use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use tracing::info;

use super::{optional_json, parse_id, reply, ApiJson, Reply};
use crate::{
    error::Resource,
    models::{User, UserDocument, UserFields},
    AppState,
};

pub async fn list_users(State(state): State<AppState>) -> Reply<Vec<User>> {
    let users = state.users.fetch_all_users().await?;
    info!(count = users.len(), "Listed users");
    reply(StatusCode::OK, users)
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Reply<User> {
    let id = parse_id(&id, Resource::User)?;
    reply(StatusCode::OK, state.users.fetch_user(id).await?)
}

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Reply<User> {
    let user = state.users.insert_user(UserDocument::try_from(body)?).await?;
    info!(id = %user.id, "Created user");
    reply(StatusCode::CREATED, user)
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Reply<User> {
    let id = parse_id(&id, Resource::User)?;
    let document = match optional_json::<Value>(&body).and_then(|body| {
        UserDocument::try_from(body.unwrap_or_else(|| Value::Object(UserFields::new())))
    }) {
        Ok(document) => document,
        Err(err) => {
            state.users.fetch_user(id).await?;
            return Err(err);
        }
    };
    let user = state.users.update_user(id, document).await?;
    info!(id = %id, "Updated user");
    reply(StatusCode::OK, user)
}

pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Reply<User> {
    let id = parse_id(&id, Resource::User)?;
    let user = state.users.delete_user(id).await?;
    info!(id = %id, "Deleted user");
    reply(StatusCode::OK, user)
}
