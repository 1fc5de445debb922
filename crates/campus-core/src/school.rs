//! School profiles and the user records that link to them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{facility::Facility, identity::Role};

pub type SchoolId = i64;
pub type UserId = i64;

/// The entity managed by a school administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolProfile {
  pub id:                  SchoolId,
  /// The user permitted to mutate this profile. Older rows may lack it; see
  /// [`crate::owner::resolve_owned_school`].
  pub owner_user_id:       Option<UserId>,

  // ── Basic info ────────────────────────────────────────────────────────
  pub name:                String,
  pub board:               String,
  pub city:                String,
  pub address:             Option<String>,
  pub state:               Option<String>,
  pub pincode:             Option<String>,
  pub description:         Option<String>,
  pub contact_email:       Option<String>,
  pub contact_phone:       Option<String>,
  pub website:             Option<String>,
  pub establishment_year:  Option<i32>,
  pub school_type:         Option<String>,

  // ── Fees ──────────────────────────────────────────────────────────────
  /// Class label → annual fee, or class label → stream → annual fee.
  pub fees_structure:      Value,
  /// Denormalized from `fees_structure` on every fee write.
  pub fees_min:            Option<f64>,
  pub fees_max:            Option<f64>,

  // ── Facilities ────────────────────────────────────────────────────────
  pub facility_flags:      BTreeMap<Facility, bool>,
  /// Free-text facility names from records that predate the typed flags.
  pub facilities:          Vec<String>,
  /// Facility display name → image URLs.
  pub facility_images:     BTreeMap<String, Vec<String>>,

  // ── Media ─────────────────────────────────────────────────────────────
  pub virtual_tour_videos: Vec<String>,
  pub gallery_images:      Vec<String>,
  pub awards:              Vec<Value>,

  // ── Directory stats ───────────────────────────────────────────────────
  pub rating:              f64,
  pub review_count:        i64,
  pub profile_views:       i64,
  pub featured:            bool,

  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

impl SchoolProfile {
  /// Names of the basic-info fields that are still blank.
  pub fn missing_basic_info(&self) -> Vec<&'static str> {
    missing_basic_info(&self.name, &self.board, &self.city)
  }
}

pub(crate) fn missing_basic_info(
  name: &str,
  board: &str,
  city: &str,
) -> Vec<&'static str> {
  [("name", name), ("board", board), ("city", city)]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect()
}

/// Input to [`crate::store::SchoolStore::insert_school`]. Profiles are only
/// created by bulk import, never through the admin surface.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewSchool {
  pub owner_user_id:       Option<UserId>,
  pub name:                String,
  pub board:               String,
  pub city:                String,
  pub address:             Option<String>,
  pub state:               Option<String>,
  pub description:         Option<String>,
  pub contact_email:       Option<String>,
  pub contact_phone:       Option<String>,
  pub website:             Option<String>,
  pub establishment_year:  Option<i32>,
  pub school_type:         Option<String>,
  pub fees_structure:      Value,
  pub facility_flags:      BTreeMap<Facility, bool>,
  pub facilities:          Vec<String>,
  pub virtual_tour_videos: Vec<String>,
  pub gallery_images:      Vec<String>,
  pub rating:              f64,
  pub featured:            bool,
}

impl NewSchool {
  pub fn new(
    name: impl Into<String>,
    board: impl Into<String>,
    city: impl Into<String>,
  ) -> Self {
    Self {
      name: name.into(),
      board: board.into(),
      city: city.into(),
      ..Self::default()
    }
  }
}

/// A row of the `users` table as seen by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
  pub id:         UserId,
  pub email:      String,
  pub role:       Role,
  /// Link to the administered school, maintained by account management.
  pub school_id:  Option<SchoolId>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::SchoolStore::insert_user`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub email:     String,
  pub role:      Role,
  #[serde(default)]
  pub school_id: Option<SchoolId>,
}

#[cfg(test)]
pub(crate) fn test_school(id: SchoolId) -> SchoolProfile {
  let now = Utc::now();
  SchoolProfile {
    id,
    owner_user_id: None,
    name: format!("School {id}"),
    board: "CBSE".into(),
    city: "Pune".into(),
    address: None,
    state: None,
    pincode: None,
    description: None,
    contact_email: None,
    contact_phone: None,
    website: None,
    establishment_year: None,
    school_type: None,
    fees_structure: Value::Object(Default::default()),
    fees_min: None,
    fees_max: None,
    facility_flags: BTreeMap::new(),
    facilities: Vec::new(),
    facility_images: BTreeMap::new(),
    virtual_tour_videos: Vec::new(),
    gallery_images: Vec::new(),
    awards: Vec::new(),
    rating: 0.0,
    review_count: 0,
    profile_views: 0,
    featured: false,
    created_at: now,
    updated_at: now,
  }
}
