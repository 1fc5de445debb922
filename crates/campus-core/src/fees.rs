//! Fee-structure aggregation.
//!
//! A fee structure is a JSON object keyed by class label (`"kg"`,
//! `"class1"`, ...). Each value is either an annual fee or, for the senior
//! classes, an object from stream (`"science"`, `"commerce"`, ...) to an
//! annual fee. Every reader here is total: values of any other shape are
//! skipped, never rejected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::school::SchoolProfile;

/// Grade labels in display order. Labels outside this list sort after it.
pub const CANONICAL_CLASSES: [&str; 16] = [
  "nursery", "kg", "lkg", "ukg", "class1", "class2", "class3", "class4",
  "class5", "class6", "class7", "class8", "class9", "class10", "class11",
  "class12",
];

/// Lowest and highest annual fee found in a fee structure. Both are `None`
/// when there is no fee data at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeRange {
  pub min: Option<f64>,
  pub max: Option<f64>,
}

fn positive_fee(value: &Value) -> Option<f64> {
  value.as_f64().filter(|fee| fee.is_finite() && *fee > 0.0)
}

/// Every positive fee in the structure, scalar classes and stream leaves.
fn fee_candidates(fees: &Value) -> Vec<f64> {
  let Value::Object(classes) = fees else {
    return Vec::new();
  };

  let mut out = Vec::new();
  for value in classes.values() {
    match value {
      Value::Number(_) => out.extend(positive_fee(value)),
      Value::Object(streams) => {
        out.extend(streams.values().filter_map(positive_fee));
      }
      _ => {}
    }
  }
  out
}

/// Compute the fee range of a fee structure.
pub fn compute_fee_range(fees: &Value) -> FeeRange {
  fee_candidates(fees)
    .into_iter()
    .fold(FeeRange::default(), |range, fee| FeeRange {
      min: Some(range.min.map_or(fee, |m| m.min(fee))),
      max: Some(range.max.map_or(fee, |m| m.max(fee))),
    })
}

// ─── Class labels ────────────────────────────────────────────────────────────

fn class_rank(base: &str) -> usize {
  let base = base.to_ascii_lowercase();
  CANONICAL_CLASSES
    .iter()
    .position(|c| *c == base)
    .unwrap_or(CANONICAL_CLASSES.len())
}

fn stream_label(base: &str, stream: &str) -> String {
  format!("{base} ({stream})")
}

/// `(base class, display label)` for every fee entry of one structure.
fn class_entries(fees: &Value) -> Vec<(String, String)> {
  let Value::Object(classes) = fees else {
    return Vec::new();
  };

  let mut out = Vec::new();
  for (base, value) in classes {
    match value {
      Value::Number(_) => out.push((base.clone(), base.clone())),
      Value::Object(streams) => out.extend(
        streams
          .keys()
          .map(|stream| (base.clone(), stream_label(base, stream))),
      ),
      _ => {}
    }
  }
  out
}

/// Union of the class labels of every school's fee structure, in display
/// order.
///
/// Stream classes contribute one label per stream (`"class11 (science)"`).
/// Canonical grades come first in grade order; unknown labels follow in
/// lexicographic order. Stream variants of one grade stay adjacent.
pub fn build_comparable_class_list(schools: &[SchoolProfile]) -> Vec<String> {
  let mut labels: BTreeMap<String, String> = BTreeMap::new();
  for school in schools {
    for (base, label) in class_entries(&school.fees_structure) {
      labels.entry(label).or_insert(base);
    }
  }

  let mut ordered: Vec<(usize, String, String)> = labels
    .into_iter()
    .map(|(label, base)| (class_rank(&base), base, label))
    .collect();
  ordered.sort();
  ordered.into_iter().map(|(_, _, label)| label).collect()
}

/// Look up the fee for a label produced by [`build_comparable_class_list`].
pub fn fee_for_label(fees: &Value, label: &str) -> Option<f64> {
  let Value::Object(classes) = fees else {
    return None;
  };

  if let Some(value @ Value::Number(_)) = classes.get(label) {
    return value.as_f64();
  }

  let (base, stream) = label.strip_suffix(')')?.split_once(" (")?;
  classes.get(base)?.get(stream)?.as_f64()
}
