//! Partial updates to a school profile from its administrator.
//!
//! A [`ProfileUpdate`] is what the caller sent; [`ProfileChanges`] is what
//! the store writes. The conversion validates everything up front so a
//! rejected update never touches storage.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{
  Error, Result,
  facility::Facility,
  fees::{FeeRange, compute_fee_range},
  json::{JsonColumn, normalize_object, normalize_string_array},
  school::{SchoolId, SchoolProfile, missing_basic_info},
  store::SchoolStore,
};

/// Plain-text columns that an update may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
  Name,
  Board,
  City,
  Address,
  State,
  Pincode,
  Description,
  ContactEmail,
  ContactPhone,
  Website,
  SchoolType,
}

impl TextField {
  pub fn column(self) -> &'static str {
    match self {
      Self::Name => "name",
      Self::Board => "board",
      Self::City => "city",
      Self::Address => "address",
      Self::State => "state",
      Self::Pincode => "pincode",
      Self::Description => "description",
      Self::ContactEmail => "contact_email",
      Self::ContactPhone => "contact_phone",
      Self::Website => "website",
      Self::SchoolType => "school_type",
    }
  }

  fn required(self) -> bool {
    matches!(self, Self::Name | Self::Board | Self::City)
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Body of a profile update. Absent (or `null`) fields are left unchanged.
/// An empty string clears an optional text field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  pub name:               Option<String>,
  pub board:              Option<String>,
  pub city:               Option<String>,
  pub address:            Option<String>,
  pub state:              Option<String>,
  pub pincode:            Option<String>,
  pub description:        Option<String>,
  pub contact_email:      Option<String>,
  pub contact_phone:      Option<String>,
  pub website:            Option<String>,
  pub school_type:        Option<String>,
  pub establishment_year: Option<i32>,

  /// Merged into the current flags; unspecified facilities keep their value.
  pub facility_flags:     Option<BTreeMap<Facility, bool>>,
  pub facilities:         Option<Value>,
  pub fees_structure:     Option<Value>,
  pub facility_images:    Option<Value>,
  pub awards:             Option<Value>,
}

impl ProfileUpdate {
  fn text_fields(&self) -> [(TextField, Option<&String>); 11] {
    [
      (TextField::Name, self.name.as_ref()),
      (TextField::Board, self.board.as_ref()),
      (TextField::City, self.city.as_ref()),
      (TextField::Address, self.address.as_ref()),
      (TextField::State, self.state.as_ref()),
      (TextField::Pincode, self.pincode.as_ref()),
      (TextField::Description, self.description.as_ref()),
      (TextField::ContactEmail, self.contact_email.as_ref()),
      (TextField::ContactPhone, self.contact_phone.as_ref()),
      (TextField::Website, self.website.as_ref()),
      (TextField::SchoolType, self.school_type.as_ref()),
    ]
  }

  /// Whether the update writes a section that only makes sense once the
  /// basic info is complete.
  fn touches_dependent_sections(&self) -> bool {
    self.facility_flags.is_some()
      || self.facilities.is_some()
      || self.fees_structure.is_some()
      || self.facility_images.is_some()
      || self.awards.is_some()
  }

  /// Checks that need no stored state.
  pub fn validate(&self) -> Result<()> {
    for (field, value) in self.text_fields() {
      if field.required() && value.is_some_and(|v| v.trim().is_empty()) {
        return Err(Error::validation(format!(
          "{} must not be empty",
          field.column()
        )));
      }
    }

    if let Some(year) = self.establishment_year {
      if !(1800..=2100).contains(&year) {
        return Err(Error::validation(format!(
          "establishmentYear out of range: {year}"
        )));
      }
    }

    if let Some(fees) = &self.fees_structure {
      validate_fees(&decode_fees(fees)?)?;
    }
    if let Some(awards) = &self.awards {
      if !matches!(awards, Value::Array(_) | Value::Null) {
        return Err(Error::validation("awards must be an array"));
      }
    }
    Ok(())
  }

  /// Validate against the current profile and produce the column writes.
  pub fn into_changes(self, current: &SchoolProfile) -> Result<ProfileChanges> {
    self.validate()?;

    if self.touches_dependent_sections() {
      let effective = |update: &Option<String>, stored: &str| {
        update.as_deref().unwrap_or(stored).to_owned()
      };
      let name = effective(&self.name, &current.name);
      let board = effective(&self.board, &current.board);
      let city = effective(&self.city, &current.city);
      let missing = missing_basic_info(&name, &board, &city);
      if !missing.is_empty() {
        return Err(Error::validation(format!(
          "complete basic info first: missing {}",
          missing.join(", ")
        )));
      }
    }

    let text = self
      .text_fields()
      .into_iter()
      .filter_map(|(field, value)| {
        let value = value?.trim();
        let value = match field {
          TextField::ContactEmail => value.to_lowercase(),
          _ => value.to_owned(),
        };
        Some((field, (!value.is_empty()).then_some(value)))
      })
      .collect();

    let facility_flags = self.facility_flags.map(|incoming| {
      let mut merged = current.facility_flags.clone();
      merged.extend(incoming);
      merged
    });

    let fees = self.fees_structure.as_ref().map(decode_fees).transpose()?;
    let fees = fees.map(|fees| {
      let fees = match fees {
        Value::Null => Value::Object(Default::default()),
        other => other,
      };
      let range = compute_fee_range(&fees);
      (fees, range)
    });

    let facility_images = self.facility_images.map(|images| {
      normalize_object(&images)
        .into_iter()
        .map(|(facility, urls)| (facility, normalize_string_array(&urls)))
        .collect()
    });

    Ok(ProfileChanges {
      text,
      establishment_year: self.establishment_year,
      facility_flags,
      facilities: self.facilities.as_ref().map(normalize_string_array),
      fees,
      facility_images,
      awards: self.awards.map(|awards| match awards {
        Value::Array(items) => items,
        _ => Vec::new(),
      }),
    })
  }
}

/// Unwrap a fee structure sent as an encoded JSON string. Other shapes pass
/// through to [`validate_fees`].
fn decode_fees(raw: &Value) -> Result<Value> {
  match raw {
    Value::String(text) => match JsonColumn::Encoded(text.clone()).into_value() {
      Value::Object(classes) => Ok(Value::Object(classes)),
      _ => Err(Error::validation("feesStructure must be an object")),
    },
    other => Ok(other.clone()),
  }
}

/// Class values must be fees, and stream maps must hold only fees.
fn validate_fees(fees: &Value) -> Result<()> {
  let classes = match fees {
    Value::Null => return Ok(()),
    Value::Object(classes) => classes,
    _ => return Err(Error::validation("feesStructure must be an object")),
  };

  let is_fee = |v: &Value| v.is_null() || v.as_f64().is_some_and(|f| f >= 0.0);
  for (class, value) in classes {
    let ok = match value {
      Value::Object(streams) => streams.values().all(is_fee),
      other => is_fee(other),
    };
    if !ok {
      return Err(Error::validation(format!(
        "feesStructure.{class} must be a non-negative number or a map of \
         stream to number"
      )));
    }
  }
  Ok(())
}

// ─── Store input ─────────────────────────────────────────────────────────────

/// Validated column writes for [`SchoolStore::update_profile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
  /// `None` clears the column.
  pub text:               Vec<(TextField, Option<String>)>,
  pub establishment_year: Option<i32>,
  pub facility_flags:     Option<BTreeMap<Facility, bool>>,
  pub facilities:         Option<Vec<String>>,
  /// The new structure with its recomputed range.
  pub fees:               Option<(Value, FeeRange)>,
  pub facility_images:    Option<BTreeMap<String, Vec<String>>>,
  pub awards:             Option<Vec<Value>>,
}

impl ProfileChanges {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

/// Apply `update` to a school and return the stored result.
pub async fn update_profile<S: SchoolStore>(
  store: &S,
  school_id: SchoolId,
  update: ProfileUpdate,
) -> Result<SchoolProfile> {
  let current = store
    .get_school(school_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::SchoolNotFound(school_id))?;

  let changes = update.into_changes(&current)?;
  if changes.is_empty() {
    return Ok(current);
  }

  if !store
    .update_profile(school_id, changes)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::SchoolNotFound(school_id));
  }
  tracing::info!(school_id, "profile updated");

  store
    .get_school(school_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::SchoolNotFound(school_id))
}
