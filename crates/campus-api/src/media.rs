//! Virtual-tour video and gallery image lists on the caller's own profile.
//!
//! | Method   | Path | Body |
//! |----------|------|------|
//! | `POST`   | `/schools/profile/videos` | `{"videoUrl"?, "videoUrls"?}` → 201 |
//! | `DELETE` | `/schools/profile/videos` | `{"videoUrl"}` → 200 |
//! | `POST`   | `/schools/profile/images` | `{"imageUrl"?, "imageUrls"?}` → 201 |
//! | `DELETE` | `/schools/profile/images` | `{"imageUrl"}` → 200 |
//! | `POST`   | `/schools/profile/facility-images` | `{"facilityName", "imageUrl"?, "imageUrls"?}` → 201 |
//! | `DELETE` | `/schools/profile/facility-images` | `{"facilityName", "imageUrl"}` → 200 |
//!
//! The caller's role is checked first, then the body, then the profile is
//! looked up, so a malformed request never reaches storage.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
};
use campus_core::{
  identity::Identity,
  media::{
    MediaInput, MediaList, add_facility_images, add_media, facility_target,
    remove_facility_image, remove_media, removal_target,
  },
  owner::{require_school_role, resolve_owned_school},
  school::SchoolProfile,
  store::SchoolStore,
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct VideoBody {
  #[serde(rename = "videoUrl")]
  pub single: Option<String>,
  #[serde(rename = "videoUrls")]
  pub many:   Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ImageBody {
  #[serde(rename = "imageUrl")]
  pub single: Option<String>,
  #[serde(rename = "imageUrls")]
  pub many:   Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityImageBody {
  pub facility_name: Option<String>,
  #[serde(rename = "imageUrl")]
  pub single:        Option<String>,
  #[serde(rename = "imageUrls")]
  pub many:          Option<Vec<String>>,
}

impl From<VideoBody> for MediaInput {
  fn from(body: VideoBody) -> Self { Self { single: body.single, many: body.many } }
}

impl From<ImageBody> for MediaInput {
  fn from(body: ImageBody) -> Self { Self { single: body.single, many: body.many } }
}

// ─── Shared flow ─────────────────────────────────────────────────────────────

async fn append<S: SchoolStore>(
  state: &AppState<S>,
  identity: &Identity,
  list: MediaList,
  input: MediaInput,
) -> Result<(StatusCode, Json<SchoolProfile>), ApiError> {
  let urls = input.into_urls(list)?;
  let school_id = resolve_owned_school(&*state.store, identity).await?;
  let school = add_media(&*state.store, school_id, list, &urls).await?;
  tracing::info!(school_id, list = list.label(), added = urls.len(), "media appended");
  Ok((StatusCode::CREATED, Json(school)))
}

async fn remove<S: SchoolStore>(
  state: &AppState<S>,
  identity: &Identity,
  list: MediaList,
  url: Option<String>,
) -> Result<Json<SchoolProfile>, ApiError> {
  let url = removal_target(list, url.as_deref().unwrap_or_default())?;
  let school_id = resolve_owned_school(&*state.store, identity).await?;
  let school = remove_media(&*state.store, school_id, list, &url).await?;
  tracing::info!(school_id, list = list.label(), "media removed");
  Ok(Json(school))
}

// ─── Videos ──────────────────────────────────────────────────────────────────

/// `POST /schools/profile/videos`
pub async fn add_videos<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  body: Result<Json<VideoBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SchoolProfile>), ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  require_school_role(&identity)?;
  let Json(body) = body?;
  append(&state, &identity, MediaList::VirtualTourVideos, body.into()).await
}

/// `DELETE /schools/profile/videos`
pub async fn remove_video<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  body: Result<Json<VideoBody>, JsonRejection>,
) -> Result<Json<SchoolProfile>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  require_school_role(&identity)?;
  let Json(body) = body?;
  remove(&state, &identity, MediaList::VirtualTourVideos, body.single).await
}

// ─── Gallery images ──────────────────────────────────────────────────────────

/// `POST /schools/profile/images`
pub async fn add_images<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  body: Result<Json<ImageBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SchoolProfile>), ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  require_school_role(&identity)?;
  let Json(body) = body?;
  append(&state, &identity, MediaList::GalleryImages, body.into()).await
}

/// `DELETE /schools/profile/images`
pub async fn remove_image<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  body: Result<Json<ImageBody>, JsonRejection>,
) -> Result<Json<SchoolProfile>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  require_school_role(&identity)?;
  let Json(body) = body?;
  remove(&state, &identity, MediaList::GalleryImages, body.single).await
}

// ─── Facility images ─────────────────────────────────────────────────────────

/// `POST /schools/profile/facility-images`
pub async fn add_facility_image<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  body: Result<Json<FacilityImageBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SchoolProfile>), ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  require_school_role(&identity)?;
  let Json(body) = body?;
  let facility = facility_target(body.facility_name.as_deref())?;
  let urls = MediaInput { single: body.single, many: body.many }
    .into_urls(MediaList::GalleryImages)?;

  let school_id = resolve_owned_school(&*state.store, &identity).await?;
  let school = add_facility_images(&*state.store, school_id, &facility, &urls).await?;
  tracing::info!(school_id, %facility, added = urls.len(), "facility images appended");
  Ok((StatusCode::CREATED, Json(school)))
}

/// `DELETE /schools/profile/facility-images`
pub async fn remove_facility_image_url<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  body: Result<Json<FacilityImageBody>, JsonRejection>,
) -> Result<Json<SchoolProfile>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  require_school_role(&identity)?;
  let Json(body) = body?;
  let facility = facility_target(body.facility_name.as_deref())?;
  let url = removal_target(
    MediaList::GalleryImages,
    body.single.as_deref().unwrap_or_default(),
  )?;

  let school_id = resolve_owned_school(&*state.store, &identity).await?;
  let school = remove_facility_image(&*state.store, school_id, &facility, &url).await?;
  tracing::info!(school_id, %facility, "facility image removed");
  Ok(Json(school))
}
