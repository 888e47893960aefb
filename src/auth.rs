use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;

/// Claims carried by an accepted bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// HS256 verifier shared by every protected route.
#[derive(Clone)]
pub struct AuthConfig {
    key: DecodingKey,
    validation: Validation,
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        decode::<Claims>(token, &self.key, &self.validation).map(|data| data.claims)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects the request with 401 unless it carries a valid bearer token.
/// On success the decoded [`Claims`] are put in the request extensions.
pub async fn require_bearer(
    State(auth): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(request.headers()) else {
        debug!("No bearer token in Authorization header");
        return Err(AppError::Unauthorized("Token no proporcionado"));
    };

    let claims = auth.verify(token).map_err(|e| {
        debug!(error = %e, "Bearer token rejected");
        AppError::Unauthorized("Token inválido o expirado")
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, exp: usize) -> String {
        encode(
            &Header::default(),
            &Claims {
                sub: "tester".to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn accepts_token_signed_with_same_secret() {
        let auth = AuthConfig::new("s3cret");
        let claims = auth.verify(&token("s3cret", in_one_hour())).unwrap();
        assert_eq!(claims.sub, "tester");
    }

    #[test]
    fn rejects_foreign_signature() {
        let auth = AuthConfig::new("s3cret");
        assert!(auth.verify(&token("other", in_one_hour())).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let auth = AuthConfig::new("s3cret");
        let an_hour_ago = (chrono::Utc::now().timestamp() - 3600) as usize;
        assert!(auth.verify(&token("s3cret", an_hour_ago)).is_err());
    }

    #[test]
    fn extracts_bearer_scheme_only() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
