//! Endpoints for a school administrator's own profile.
//!
//! Both require a `school` token; the profile is found through
//! [`resolve_owned_school`].

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use campus_core::{
  owner::{require_school_role, resolve_owned_school},
  profile::{ProfileUpdate, update_profile},
  school::SchoolProfile,
  store::SchoolStore,
};

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /schools/profile`
pub async fn get_own<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
) -> Result<Json<SchoolProfile>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  let school_id = resolve_owned_school(&*state.store, &identity).await?;
  let school = state
    .store
    .get_school(school_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::not_found("SCHOOL_NOT_FOUND", "school details not found")
    })?;
  Ok(Json(school))
}

/// `PUT /schools/profile`, body: any subset of [`ProfileUpdate`].
pub async fn update_own<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<SchoolProfile>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  require_school_role(&identity)?;
  let Json(update) = body?;
  update.validate()?;

  let school_id = resolve_owned_school(&*state.store, &identity).await?;
  let school = update_profile(&*state.store, school_id, update).await?;
  Ok(Json(school))
}
