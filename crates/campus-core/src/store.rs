//! The `SchoolStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `campus-store-sqlite`).
//! Higher layers (`campus-api`, the operations in this crate) depend on this
//! abstraction, not on any concrete backend.

use std::{collections::BTreeMap, future::Future};

use serde::Deserialize;

use crate::{
  enquiry::{Enquiry, EnquiryChanges, EnquiryId, EnquiryQuery, EnquiryStatus, NewEnquiry},
  media::MediaList,
  profile::ProfileChanges,
  school::{NewSchool, NewUser, SchoolId, SchoolProfile, UserId, UserRecord},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Default page size for [`SchoolStore::list_schools`].
pub const DEFAULT_LIMIT: usize = 50;
/// Largest page a caller may request.
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
  #[default]
  Rating,
  Name,
  FeesMin,
  FeesMax,
  ProfileViews,
  EstablishmentYear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

/// Parameters for [`SchoolStore::list_schools`].
#[derive(Debug, Clone, Default)]
pub struct SchoolQuery {
  /// Case-insensitive substring over name, city and address.
  pub text:       Option<String>,
  /// Any of these cities; empty means all.
  pub cities:     Vec<String>,
  pub board:      Option<String>,
  pub featured:   Option<bool>,
  /// Lower bound on the school's minimum fee.
  pub fees_min:   Option<f64>,
  /// Upper bound on the school's maximum fee.
  pub fees_max:   Option<f64>,
  pub min_rating: Option<f64>,
  /// Every term must match; see [`crate::facility::matches_facility_term`].
  pub facilities: Vec<String>,
  pub sort:       SortKey,
  pub order:      SortOrder,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

impl SchoolQuery {
  /// Requested page size, clamped to [`MAX_LIMIT`].
  pub fn effective_limit(&self) -> usize {
    self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
  }

  pub fn effective_offset(&self) -> usize { self.offset.unwrap_or(0) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the school directory backend.
///
/// Every mutation is a single-row UPDATE that replaces whole column values;
/// there is no cross-table transaction and no optimistic concurrency check.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SchoolStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Out-of-band creation ──────────────────────────────────────────────

  /// Persist a new school profile (bulk import only).
  fn insert_school(
    &self,
    input: NewSchool,
  ) -> impl Future<Output = Result<SchoolProfile, Self::Error>> + Send + '_;

  /// Persist a new user record (bulk import only).
  fn insert_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send + '_;

  // ── Point lookups ─────────────────────────────────────────────────────

  /// Retrieve a school by id. Returns `None` if not found.
  fn get_school(
    &self,
    id: SchoolId,
  ) -> impl Future<Output = Result<Option<SchoolProfile>, Self::Error>> + Send + '_;

  /// The id of the school whose `owner_user_id` is `user_id`, if any.
  fn find_school_id_by_owner(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<SchoolId>, Self::Error>> + Send + '_;

  /// Retrieve a user record by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Set `owner_user_id` on a school whose owner is still null.
  ///
  /// Returns `false` when the school is missing or already owned.
  fn link_owner(
    &self,
    school_id: SchoolId,
    user_id: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Replace a media list and bump `updated_at`. Returns `false` if the
  /// school does not exist.
  fn replace_media(
    &self,
    school_id: SchoolId,
    list: MediaList,
    urls: Vec<String>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Apply validated profile changes and bump `updated_at`. Returns `false`
  /// if the school does not exist.
  fn update_profile(
    &self,
    school_id: SchoolId,
    changes: ProfileChanges,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Count one public view of a school's detail page.
  fn record_profile_view(
    &self,
    school_id: SchoolId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Directory reads ───────────────────────────────────────────────────

  /// Search the directory.
  fn list_schools<'a>(
    &'a self,
    query: &'a SchoolQuery,
  ) -> impl Future<Output = Result<Vec<SchoolProfile>, Self::Error>> + Send + 'a;

  /// Fetch several schools, in the order of `ids`, skipping unknown ids.
  fn get_schools<'a>(
    &'a self,
    ids: &'a [SchoolId],
  ) -> impl Future<Output = Result<Vec<SchoolProfile>, Self::Error>> + Send + 'a;

  // ── Enquiries ─────────────────────────────────────────────────────────

  /// Persist a new enquiry with status `New` and no notes.
  fn insert_enquiry(
    &self,
    input: NewEnquiry,
  ) -> impl Future<Output = Result<Enquiry, Self::Error>> + Send + '_;

  fn get_enquiry(
    &self,
    id: EnquiryId,
  ) -> impl Future<Output = Result<Option<Enquiry>, Self::Error>> + Send + '_;

  /// One page of enquiries matching `query`, newest first.
  fn list_enquiries<'a>(
    &'a self,
    query: &'a EnquiryQuery,
  ) -> impl Future<Output = Result<Vec<Enquiry>, Self::Error>> + Send + 'a;

  /// Number of enquiries matching `query`, ignoring its paging.
  fn count_enquiries<'a>(
    &'a self,
    query: &'a EnquiryQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Count a school's enquiries by status. Statuses with no enquiries are
  /// absent.
  fn enquiry_status_counts(
    &self,
    school_id: SchoolId,
  ) -> impl Future<Output = Result<BTreeMap<EnquiryStatus, u64>, Self::Error>> + Send + '_;

  /// Apply changes and bump `updated_at`. Returns `false` if the enquiry
  /// does not exist.
  fn update_enquiry(
    &self,
    id: EnquiryId,
    changes: EnquiryChanges,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
