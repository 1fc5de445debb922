//! JSON REST API for the campus school directory.
//!
//! Exposes an axum [`Router`] backed by any [`SchoolStore`]. TLS and
//! transport concerns are the caller's responsibility; bearer tokens are
//! verified here.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", campus_api::api_router(state))
//! ```

pub mod auth;
pub mod enquiries;
pub mod error;
pub mod media;
pub mod profile;
pub mod schools;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use campus_core::store::SchoolStore;

pub use auth::{AuthConfig, Authenticated};
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: SchoolStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

impl<S: SchoolStore> AppState<S> {
  pub fn new(store: S, auth: AuthConfig) -> Self {
    Self { store: Arc::new(store), auth: Arc::new(auth) }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Public directory
    .route("/schools", get(schools::list::<S>))
    .route("/schools/compare", get(schools::compare::<S>))
    .route("/schools/{id}", get(schools::get_one::<S>))
    // Administrator's own profile
    .route(
      "/schools/profile",
      get(profile::get_own::<S>).put(profile::update_own::<S>),
    )
    .route(
      "/schools/profile/videos",
      post(media::add_videos::<S>).delete(media::remove_video::<S>),
    )
    .route(
      "/schools/profile/images",
      post(media::add_images::<S>).delete(media::remove_image::<S>),
    )
    .route(
      "/schools/profile/facility-images",
      post(media::add_facility_image::<S>)
        .delete(media::remove_facility_image_url::<S>),
    )
    // Enquiries and leads
    .route(
      "/enquiries",
      post(enquiries::submit::<S>).get(enquiries::list_sent::<S>),
    )
    .route("/enquiries/{id}", put(enquiries::update::<S>))
    .route("/schools/enquiries", get(enquiries::list_for_school::<S>))
    .with_state(state)
}
