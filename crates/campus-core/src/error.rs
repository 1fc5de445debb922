//! Error types for `campus-core`.

use thiserror::Error;

use crate::{
  enquiry::EnquiryId,
  identity::Role,
  media::MediaList,
  school::{SchoolId, UserId},
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("role {0} may not perform this action")]
  ForbiddenRole(Role),

  #[error("no school profile is linked to user {0}")]
  NoOwnedSchool(UserId),

  #[error("school not found: {0}")]
  SchoolNotFound(SchoolId),

  #[error("{} entry not found: {url}", .list.label())]
  MediaNotFound { list: MediaList, url: String },

  #[error("image not found for facility {facility:?}: {url}")]
  FacilityImageNotFound { facility: String, url: String },

  #[error("enquiry not found: {0}")]
  EnquiryNotFound(EnquiryId),

  #[error("{0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
