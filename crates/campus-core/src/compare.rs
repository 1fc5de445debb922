//! Side-by-side comparison of a handful of schools.

use serde::Serialize;
use strum::IntoEnumIterator as _;

use crate::{
  Error, Result,
  facility::{Facility, FacilityCategory, has_facility},
  fees::{FeeRange, build_comparable_class_list, compute_fee_range, fee_for_label},
  school::{SchoolId, SchoolProfile},
};

/// Fewest schools a comparison accepts.
pub const MIN_COMPARED: usize = 2;
/// Most schools a comparison accepts.
pub const MAX_COMPARED: usize = 4;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedSchool {
  pub id:        SchoolId,
  pub name:      String,
  pub city:      String,
  pub board:     String,
  pub rating:    f64,
  pub fee_range: FeeRange,
}

/// One class label, with each school's fee in input order.
#[derive(Debug, Clone, Serialize)]
pub struct ClassRow {
  pub label: String,
  pub fees:  Vec<Option<f64>>,
}

/// One facility, with whether each school offers it in input order.
#[derive(Debug, Clone, Serialize)]
pub struct FacilityRow {
  pub facility: Facility,
  pub label:    &'static str,
  pub category: FacilityCategory,
  pub present:  Vec<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
  pub schools:    Vec<ComparedSchool>,
  pub classes:    Vec<ClassRow>,
  /// Only facilities at least one of the schools offers.
  pub facilities: Vec<FacilityRow>,
}

impl Comparison {
  pub fn build(schools: &[SchoolProfile]) -> Result<Self> {
    if !(MIN_COMPARED..=MAX_COMPARED).contains(&schools.len()) {
      return Err(Error::validation(format!(
        "compare between {MIN_COMPARED} and {MAX_COMPARED} schools, got {}",
        schools.len()
      )));
    }

    let compared = schools
      .iter()
      .map(|s| ComparedSchool {
        id:        s.id,
        name:      s.name.clone(),
        city:      s.city.clone(),
        board:     s.board.clone(),
        rating:    s.rating,
        fee_range: compute_fee_range(&s.fees_structure),
      })
      .collect();

    let classes = build_comparable_class_list(schools)
      .into_iter()
      .map(|label| ClassRow {
        fees: schools
          .iter()
          .map(|s| fee_for_label(&s.fees_structure, &label))
          .collect(),
        label,
      })
      .collect();

    let facilities = Facility::iter()
      .filter_map(|facility| {
        let present: Vec<bool> =
          schools.iter().map(|s| has_facility(s, facility)).collect();
        present.contains(&true).then(|| FacilityRow {
          facility,
          label: facility.label(),
          category: facility.category(),
          present,
        })
      })
      .collect();

    Ok(Self { schools: compared, classes, facilities })
  }
}
