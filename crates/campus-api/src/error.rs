//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"error": <message>, "code": <stable code>}`.
//! Internal failures are logged here and reach the client only as a generic
//! message.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use campus_core::{Error as CoreError, identity::Role, media::MediaList};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or invalid authorization header")]
  MissingAuthHeader,

  #[error("invalid or expired token")]
  InvalidToken,

  #[error("access denied for role {0}")]
  ForbiddenRole(Role),

  #[error("{message}")]
  NotFound {
    code:    &'static str,
    message: String,
  },

  #[error("{0}")]
  Validation(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
    Self::NotFound { code, message: message.into() }
  }

  /// Box a backend error into [`ApiError::Internal`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Internal(Box::new(err))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::MissingAuthHeader | Self::InvalidToken => StatusCode::UNAUTHORIZED,
      Self::ForbiddenRole(_) => StatusCode::FORBIDDEN,
      Self::NotFound { .. } => StatusCode::NOT_FOUND,
      Self::Validation(_) => StatusCode::BAD_REQUEST,
      Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::MissingAuthHeader => "MISSING_AUTH_HEADER",
      Self::InvalidToken => "INVALID_TOKEN",
      Self::ForbiddenRole(_) => "FORBIDDEN_ROLE",
      Self::NotFound { code, .. } => *code,
      Self::Validation(_) => "VALIDATION_ERROR",
      Self::Internal(_) => "INTERNAL_ERROR",
    }
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self {
    match err {
      CoreError::ForbiddenRole(role) => Self::ForbiddenRole(role),
      CoreError::NoOwnedSchool(_) => {
        Self::not_found("PROFILE_NOT_FOUND", "school profile not found")
      }
      CoreError::SchoolNotFound(id) => {
        Self::not_found("SCHOOL_NOT_FOUND", format!("school {id} not found"))
      }
      CoreError::MediaNotFound { list, .. } => {
        let code = match list {
          MediaList::VirtualTourVideos => "VIDEO_NOT_FOUND",
          MediaList::GalleryImages => "IMAGE_NOT_FOUND",
        };
        Self::not_found(code, format!("{} url not found", list.label()))
      }
      CoreError::FacilityImageNotFound { facility, .. } => Self::not_found(
        "IMAGE_NOT_FOUND",
        format!("image url not found for facility {facility:?}"),
      ),
      CoreError::EnquiryNotFound(id) => {
        Self::not_found("ENQUIRY_NOT_FOUND", format!("enquiry {id} not found"))
      }
      CoreError::Validation(message) => Self::Validation(message),
      other @ (CoreError::Serialization(_) | CoreError::Store(_)) => {
        Self::Internal(Box::new(other))
      }
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = match &self {
      Self::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        "internal server error".to_owned()
      }
      other => other.to_string(),
    };
    let body = Json(json!({ "error": message, "code": self.code() }));
    (self.status(), body).into_response()
  }
}
