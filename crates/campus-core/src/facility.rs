//! Typed facility flags and the legacy free-text facility list.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use strum::IntoEnumIterator as _;

use crate::school::SchoolProfile;

/// Grouping used when facilities are displayed side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityCategory {
  Academic,
  Sports,
  Technology,
  Transport,
  HealthSafety,
  Boarding,
  Other,
}

/// One of the independently settable facility flags on a school profile.
///
/// The wire form is the flag key (`"hasLibrary"`); declaration order is the
/// display order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumIter,
)]
pub enum Facility {
  // ── Academic ──────────────────────────────────────────────────────────
  Library,
  ComputerLab,
  PhysicsLab,
  ChemistryLab,
  BiologyLab,
  MathsLab,
  LanguageLab,
  RoboticsLab,
  StemLab,
  Auditorium,

  // ── Sports & fitness ──────────────────────────────────────────────────
  Playground,
  SwimmingPool,
  FitnessCentre,
  Yoga,
  MartialArts,
  MusicDance,
  HorseRiding,

  // ── Technology ────────────────────────────────────────────────────────
  SmartBoard,
  Wifi,
  Cctv,
  Elearning,
  AcClassrooms,
  AiTools,

  // ── Transport ─────────────────────────────────────────────────────────
  Transport,
  GpsBuses,
  CctvBuses,
  BusCaretaker,

  // ── Health & safety ───────────────────────────────────────────────────
  MedicalRoom,
  DoctorNurse,
  FireSafety,
  CleanWater,
  SecurityGuards,
  AirPurifier,

  // ── Boarding ──────────────────────────────────────────────────────────
  Hostel,
  Mess,
  HostelStudyRoom,
  AcHostel,

  // ── Other ─────────────────────────────────────────────────────────────
  Cafeteria,
}

impl Facility {
  /// `(key, display label, category)` for every facility.
  fn descriptor(self) -> (&'static str, &'static str, FacilityCategory) {
    use FacilityCategory::*;
    match self {
      Self::Library => ("hasLibrary", "Library", Academic),
      Self::ComputerLab => ("hasComputerLab", "Computer Lab", Academic),
      Self::PhysicsLab => ("hasPhysicsLab", "Physics Lab", Academic),
      Self::ChemistryLab => ("hasChemistryLab", "Chemistry Lab", Academic),
      Self::BiologyLab => ("hasBiologyLab", "Biology Lab", Academic),
      Self::MathsLab => ("hasMathsLab", "Maths Lab", Academic),
      Self::LanguageLab => ("hasLanguageLab", "Language Lab", Academic),
      Self::RoboticsLab => ("hasRoboticsLab", "Robotics Lab", Academic),
      Self::StemLab => ("hasStemLab", "STEM/Innovation Lab", Academic),
      Self::Auditorium => ("hasAuditorium", "Auditorium Hall", Academic),
      Self::Playground => ("hasPlayground", "Playground", Sports),
      Self::SwimmingPool => ("hasSwimmingPool", "Swimming Pool", Sports),
      Self::FitnessCentre => ("hasFitnessCentre", "Fitness Centre", Sports),
      Self::Yoga => ("hasYoga", "Yoga", Sports),
      Self::MartialArts => ("hasMartialArts", "Martial Arts Training", Sports),
      Self::MusicDance => ("hasMusicDance", "Music & Dance Class", Sports),
      Self::HorseRiding => (
        "hasHorseRiding",
        "Horse Riding / Archery / Shooting Range",
        Sports,
      ),
      Self::SmartBoard => ("hasSmartBoard", "Smart Board", Technology),
      Self::Wifi => ("hasWifi", "WiFi Campus", Technology),
      Self::Cctv => ("hasCctv", "CCTV System", Technology),
      Self::Elearning => ("hasElearning", "E-Learning Platform", Technology),
      Self::AcClassrooms => {
        ("hasAcClassrooms", "Air Conditioned Classrooms", Technology)
      }
      Self::AiTools => ("hasAiTools", "AI Enable Learning Tools", Technology),
      Self::Transport => ("hasTransport", "School Bus/Vans", Transport),
      Self::GpsBuses => ("hasGpsBuses", "GPS Enabled Buses", Transport),
      Self::CctvBuses => ("hasCctvBuses", "CCTV in Buses", Transport),
      Self::BusCaretaker => ("hasBusCaretaker", "Caretaker in Bus", Transport),
      Self::MedicalRoom => ("hasMedicalRoom", "Medical Room", HealthSafety),
      Self::DoctorNurse => {
        ("hasDoctorNurse", "On Campus Doctor/Nurse", HealthSafety)
      }
      Self::FireSafety => ("hasFireSafety", "Fire Safety", HealthSafety),
      Self::CleanWater => ("hasCleanWater", "Clean Drinking Water", HealthSafety),
      Self::SecurityGuards => {
        ("hasSecurityGuards", "Security Guards", HealthSafety)
      }
      Self::AirPurifier => {
        ("hasAirPurifier", "Air Purifier in Classroom", HealthSafety)
      }
      Self::Hostel => ("hasHostel", "Hostel", Boarding),
      Self::Mess => ("hasMess", "Mess", Boarding),
      Self::HostelStudyRoom => {
        ("hasHostelStudyRoom", "Study Room in Hostel", Boarding)
      }
      Self::AcHostel => ("hasAcHostel", "Air Conditioner Hostel", Boarding),
      Self::Cafeteria => ("hasCafeteria", "Cafeteria", Other),
    }
  }

  /// The flag key, e.g. `"hasLibrary"`.
  pub fn key(self) -> &'static str { self.descriptor().0 }

  /// Human-readable label; also what legacy free-text lists contain.
  pub fn label(self) -> &'static str { self.descriptor().1 }

  pub fn category(self) -> FacilityCategory { self.descriptor().2 }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::iter().find(|f| f.key() == key)
  }

  /// Find a facility by display label, ignoring ASCII case.
  pub fn from_label(label: &str) -> Option<Self> {
    let label = label.trim();
    Self::iter().find(|f| f.label().eq_ignore_ascii_case(label))
  }
}

impl fmt::Display for Facility {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}

impl Serialize for Facility {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.key())
  }
}

impl<'de> Deserialize<'de> for Facility {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let key = String::deserialize(deserializer)?;
    Self::from_key(&key)
      .ok_or_else(|| de::Error::custom(format!("unknown facility: {key:?}")))
  }
}

// ─── Checks ──────────────────────────────────────────────────────────────────

/// Whether `school` offers `facility`.
///
/// The typed flag wins when it is exactly `true`; records that predate the
/// flags are matched by display label against the legacy list.
pub fn has_facility(school: &SchoolProfile, facility: Facility) -> bool {
  if school.facility_flags.get(&facility) == Some(&true) {
    return true;
  }
  school
    .facilities
    .iter()
    .any(|f| f.eq_ignore_ascii_case(facility.label()))
}

/// Directory filter: whether `school` satisfies one requested facility term.
///
/// A term matches any legacy entry containing it, a typed facility whose
/// label it names, or one of the group terms used by the search page.
pub fn matches_facility_term(school: &SchoolProfile, term: &str) -> bool {
  let term = term.trim().to_lowercase();
  if term.is_empty() {
    return true;
  }

  if school
    .facilities
    .iter()
    .any(|f| f.to_lowercase().contains(&term))
  {
    return true;
  }

  let group: &[Facility] = match term.as_str() {
    "science lab" => &[
      Facility::PhysicsLab,
      Facility::ChemistryLab,
      Facility::BiologyLab,
    ],
    "sports complex" => &[Facility::Playground],
    "smart classrooms" => &[Facility::SmartBoard],
    "transport" => &[Facility::Transport],
    "auditorium" => &[Facility::Auditorium],
    _ => &[],
  };
  if group.iter().any(|f| has_facility(school, *f)) {
    return true;
  }

  Facility::from_label(&term).is_some_and(|f| has_facility(school, f))
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;
  use crate::school::test_school;

  #[test]
  fn every_facility_has_a_unique_key() {
    let all: Vec<Facility> = Facility::iter().collect();
    assert_eq!(all.len(), 38);
    for f in &all {
      assert_eq!(Facility::from_key(f.key()), Some(*f));
    }
  }

  #[test]
  fn serde_uses_flag_key() {
    let json = serde_json::to_string(&Facility::Wifi).unwrap();
    assert_eq!(json, "\"hasWifi\"");
    let back: Facility = serde_json::from_str("\"hasMedicalRoom\"").unwrap();
    assert_eq!(back, Facility::MedicalRoom);
    assert!(serde_json::from_str::<Facility>("\"hasMoat\"").is_err());
  }

  #[test]
  fn flag_true_wins() {
    let mut school = test_school(1);
    school.facility_flags.insert(Facility::Library, true);
    assert!(has_facility(&school, Facility::Library));
  }

  #[test]
  fn legacy_label_matches_case_insensitively() {
    let mut school = test_school(1);
    school.facilities = vec!["swimming POOL".into()];
    assert!(has_facility(&school, Facility::SwimmingPool));
    assert!(!has_facility(&school, Facility::Library));
  }

  #[test]
  fn false_flag_still_checks_legacy_list() {
    let mut school = test_school(1);
    school.facility_flags.insert(Facility::Hostel, false);
    school.facilities = vec!["Hostel".into()];
    assert!(has_facility(&school, Facility::Hostel));
  }

  #[test]
  fn legacy_match_is_exact_not_substring() {
    let mut school = test_school(1);
    school.facilities = vec!["Library and reading room".into()];
    assert!(!has_facility(&school, Facility::Library));
  }

  #[test]
  fn group_terms_match_typed_flags() {
    let mut school = test_school(1);
    school.facility_flags.insert(Facility::ChemistryLab, true);
    assert!(matches_facility_term(&school, "Science Lab"));
    assert!(!matches_facility_term(&school, "hostel"));
    school.facilities = vec!["Boys Hostel".into()];
    assert!(matches_facility_term(&school, "hostel"));
  }
}
