//! Bulk seeding of schools and user records from a JSON file.
//!
//! ```json
//! {
//!   "schools": [{ "name": "Green Valley", "board": "CBSE", "city": "Pune" }],
//!   "users":   [{ "email": "head@gv.edu", "role": "school", "schoolIndex": 0 }]
//! }
//! ```
//!
//! `schoolIndex` points into `schools` and is resolved to the inserted id;
//! `schoolId` may be used instead to link an existing row.

use std::path::Path;

use anyhow::{Context as _, bail};
use campus_core::{
  identity::Role,
  school::{NewSchool, NewUser, SchoolId},
  store::SchoolStore,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportUser {
  pub email:        String,
  pub role:         Role,
  #[serde(default)]
  pub school_id:    Option<SchoolId>,
  #[serde(default)]
  pub school_index: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportFile {
  #[serde(default)]
  pub schools: Vec<NewSchool>,
  #[serde(default)]
  pub users:   Vec<ImportUser>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
  pub schools: usize,
  pub users:   usize,
}

pub fn read_file(path: &Path) -> anyhow::Result<ImportFile> {
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {}", path.display()))?;
  serde_json::from_str(&text)
    .with_context(|| format!("failed to parse {}", path.display()))
}

/// Insert every school, then every user, linking users by index or id.
pub async fn run<S: SchoolStore>(
  store: &S,
  file: ImportFile,
) -> anyhow::Result<ImportSummary> {
  let mut school_ids = Vec::with_capacity(file.schools.len());
  for school in file.schools {
    let name = school.name.clone();
    let inserted = store
      .insert_school(school)
      .await
      .with_context(|| format!("failed to insert school {name:?}"))?;
    tracing::debug!(school_id = inserted.id, %name, "imported school");
    school_ids.push(inserted.id);
  }

  let mut users = 0;
  for user in file.users {
    let school_id = match (user.school_index, user.school_id) {
      (Some(index), _) => match school_ids.get(index) {
        Some(id) => Some(*id),
        None => bail!("user {:?}: schoolIndex {index} out of range", user.email),
      },
      (None, id) => id,
    };
    store
      .insert_user(NewUser { email: user.email.clone(), role: user.role, school_id })
      .await
      .with_context(|| format!("failed to insert user {:?}", user.email))?;
    users += 1;
  }

  Ok(ImportSummary { schools: school_ids.len(), users })
}
