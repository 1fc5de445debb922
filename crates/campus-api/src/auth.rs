//! Bearer-token extractor and standalone verifier.

use axum::{
  extract::{FromRequestParts, OptionalFromRequestParts},
  http::{HeaderMap, header, request::Parts},
};
use campus_core::{
  identity::{Identity, Role},
  school::UserId,
  store::SchoolStore,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Key material for verifying session tokens.
#[derive(Clone)]
pub struct AuthConfig {
  decoding:   DecodingKey,
  validation: Validation,
}

impl AuthConfig {
  /// Tokens signed with HS256 under `secret`. Expiry is enforced.
  pub fn hs256(secret: &[u8]) -> Self {
    Self {
      decoding:   DecodingKey::from_secret(secret),
      validation: Validation::new(Algorithm::HS256),
    }
  }
}

/// Payload of a session token as issued by the login flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
  pub user_id: UserId,
  pub email:   String,
  pub role:    String,
  pub exp:     u64,
}

/// Present in a handler means the request carried a valid token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

/// Verify the `Authorization: Bearer` header and return the caller.
pub fn verify_bearer(
  headers: &HeaderMap,
  config: &AuthConfig,
) -> Result<Identity, ApiError> {
  let token = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(ApiError::MissingAuthHeader)?;

  let claims = decode::<Claims>(token, &config.decoding, &config.validation)
    .map_err(|e| {
      tracing::debug!(error = %e, "rejected bearer token");
      ApiError::InvalidToken
    })?
    .claims;

  let role = Role::from_claim(&claims.role).ok_or(ApiError::InvalidToken)?;

  Ok(Identity {
    user_id: claims.user_id,
    email: claims.email,
    role,
  })
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_bearer(&parts.headers, &state.auth).map(Authenticated)
  }
}

/// For endpoints open to guests: no bearer header means `None`, but a
/// header that is present must verify.
impl<S> OptionalFromRequestParts<AppState<S>> for Authenticated
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Option<Self>, Self::Rejection> {
    match verify_bearer(&parts.headers, &state.auth) {
      Ok(identity) => Ok(Some(Authenticated(identity))),
      Err(ApiError::MissingAuthHeader) => Ok(None),
      Err(e) => Err(e),
    }
  }
}
