//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Semi-structured fields are
//! stored as compact JSON and decoded through [`JsonColumn`], so a malformed
//! column reads as empty instead of failing the whole row.

use std::collections::BTreeMap;

use campus_core::{
  enquiry::{Enquiry, EnquiryNote, EnquiryStatus},
  facility::Facility,
  identity::Role,
  json::JsonColumn,
  school::{SchoolProfile, UserRecord},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Follow-up dates are plain `YYYY-MM-DD`. Older rows may carry a full
/// timestamp, whose date part is used; anything else reads as unset.
pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Option<NaiveDate> {
  s.trim()
    .get(..10)
    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> {
  Role::from_claim(s).ok_or_else(|| Error::UnknownRole(s.to_owned()))
}

// ─── Enquiry status ──────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<EnquiryStatus> {
  s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

/// Flags are stored keyed by flag name. Unknown keys and non-boolean values
/// are dropped.
pub fn decode_facility_flags(column: JsonColumn) -> BTreeMap<Facility, bool> {
  column
    .into_object()
    .into_iter()
    .filter_map(|(key, value)| Some((Facility::from_key(&key)?, value.as_bool()?)))
    .collect()
}

pub fn decode_facility_images(column: JsonColumn) -> BTreeMap<String, Vec<String>> {
  column
    .into_object()
    .into_iter()
    .map(|(facility, urls)| {
      (facility, JsonColumn::from_value(urls).into_string_array())
    })
    .collect()
}

fn decode_fees(column: JsonColumn) -> Value {
  Value::Object(column.into_object())
}

/// Notes are a JSON array of `{date, text}`. A column holding plain text is
/// a single note written at `created_at`.
pub fn decode_notes(text: Option<&str>, created_at: DateTime<Utc>) -> Vec<EnquiryNote> {
  match JsonColumn::from_text(text) {
    JsonColumn::Encoded(raw) if serde_json::from_str::<Value>(&raw).is_err() => {
      vec![EnquiryNote { at: created_at, text: raw }]
    }
    column => column
      .into_array()
      .into_iter()
      .filter_map(|note| serde_json::from_value(note).ok())
      .collect(),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `schools` row.
pub struct RawSchool {
  pub id:                  i64,
  pub owner_user_id:       Option<i64>,
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
  pub fees_structure:      Option<String>,
  pub fees_min:            Option<f64>,
  pub fees_max:            Option<f64>,
  pub facility_flags:      Option<String>,
  pub facilities:          Option<String>,
  pub facility_images:     Option<String>,
  pub virtual_tour_videos: Option<String>,
  pub gallery_images:      Option<String>,
  pub awards:              Option<String>,
  pub rating:              f64,
  pub review_count:        i64,
  pub profile_views:       i64,
  pub featured:            bool,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawSchool {
  /// Read a row selected with [`crate::schema::SCHOOL_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      owner_user_id:       row.get(1)?,
      name:                row.get(2)?,
      board:               row.get(3)?,
      city:                row.get(4)?,
      address:             row.get(5)?,
      state:               row.get(6)?,
      pincode:             row.get(7)?,
      description:         row.get(8)?,
      contact_email:       row.get(9)?,
      contact_phone:       row.get(10)?,
      website:             row.get(11)?,
      establishment_year:  row.get(12)?,
      school_type:         row.get(13)?,
      fees_structure:      row.get(14)?,
      fees_min:            row.get(15)?,
      fees_max:            row.get(16)?,
      facility_flags:      row.get(17)?,
      facilities:          row.get(18)?,
      facility_images:     row.get(19)?,
      virtual_tour_videos: row.get(20)?,
      gallery_images:      row.get(21)?,
      awards:              row.get(22)?,
      rating:              row.get(23)?,
      review_count:        row.get(24)?,
      profile_views:       row.get(25)?,
      featured:            row.get(26)?,
      created_at:          row.get(27)?,
      updated_at:          row.get(28)?,
    })
  }

  pub fn into_school(self) -> Result<SchoolProfile> {
    let column = |text: &Option<String>| JsonColumn::from_text(text.as_deref());

    Ok(SchoolProfile {
      id:                  self.id,
      owner_user_id:       self.owner_user_id,
      name:                self.name,
      board:               self.board,
      city:                self.city,
      address:             self.address,
      state:               self.state,
      pincode:             self.pincode,
      description:         self.description,
      contact_email:       self.contact_email,
      contact_phone:       self.contact_phone,
      website:             self.website,
      establishment_year:  self.establishment_year,
      school_type:         self.school_type,
      fees_structure:      decode_fees(column(&self.fees_structure)),
      fees_min:            self.fees_min,
      fees_max:            self.fees_max,
      facility_flags:      decode_facility_flags(column(&self.facility_flags)),
      facilities:          column(&self.facilities).into_string_array(),
      facility_images:     decode_facility_images(column(&self.facility_images)),
      virtual_tour_videos: column(&self.virtual_tour_videos).into_string_array(),
      gallery_images:      column(&self.gallery_images).into_string_array(),
      awards:              column(&self.awards).into_array(),
      rating:              self.rating,
      review_count:        self.review_count,
      profile_views:       self.profile_views,
      featured:            self.featured,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:         i64,
  pub email:      String,
  pub role:       String,
  pub school_id:  Option<i64>,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      email:      row.get(1)?,
      role:       row.get(2)?,
      school_id:  row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<UserRecord> {
    Ok(UserRecord {
      id:         self.id,
      email:      self.email,
      role:       decode_role(&self.role)?,
      school_id:  self.school_id,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `enquiries` row.
pub struct RawEnquiry {
  pub id:             i64,
  pub school_id:      i64,
  pub parent_user_id: Option<i64>,
  pub student_name:   String,
  pub student_email:  String,
  pub student_phone:  String,
  pub student_class:  String,
  pub message:        Option<String>,
  pub status:         String,
  pub notes:          Option<String>,
  pub follow_up_date: Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawEnquiry {
  /// Read a row selected with [`crate::schema::ENQUIRY_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      school_id:      row.get(1)?,
      parent_user_id: row.get(2)?,
      student_name:   row.get(3)?,
      student_email:  row.get(4)?,
      student_phone:  row.get(5)?,
      student_class:  row.get(6)?,
      message:        row.get(7)?,
      status:         row.get(8)?,
      notes:          row.get(9)?,
      follow_up_date: row.get(10)?,
      created_at:     row.get(11)?,
      updated_at:     row.get(12)?,
    })
  }

  pub fn into_enquiry(self) -> Result<Enquiry> {
    let created_at = decode_dt(&self.created_at)?;
    Ok(Enquiry {
      id:             self.id,
      school_id:      self.school_id,
      parent_user_id: self.parent_user_id,
      student_name:   self.student_name,
      student_email:  self.student_email,
      student_phone:  self.student_phone,
      student_class:  self.student_class,
      message:        self.message,
      status:         decode_status(&self.status)?,
      notes:          decode_notes(self.notes.as_deref(), created_at),
      follow_up_date: self.follow_up_date.as_deref().and_then(decode_date),
      created_at,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}
