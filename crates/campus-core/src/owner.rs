//! Mapping an authenticated caller to the school profile they administer.

use crate::{
  Error, Result,
  identity::{Identity, Role},
  school::SchoolId,
  store::SchoolStore,
};

/// Only `school` accounts administer a profile. Needs no storage, so
/// handlers run it before looking at the request body.
pub fn require_school_role(identity: &Identity) -> Result<()> {
  if identity.role != Role::School {
    return Err(Error::ForbiddenRole(identity.role));
  }
  Ok(())
}

/// Find the school `identity` administers.
///
/// The direct `owner_user_id` link wins. Records that predate that link are
/// found through the user's `school_id`; when such a school has no owner
/// yet, the link is written back so the next call takes the direct path.
/// The write-back is best-effort and never fails the resolution.
pub async fn resolve_owned_school<S: SchoolStore>(
  store: &S,
  identity: &Identity,
) -> Result<SchoolId> {
  require_school_role(identity)?;
  let user_id = identity.user_id;

  if let Some(id) = store
    .find_school_id_by_owner(user_id)
    .await
    .map_err(Error::store)?
  {
    return Ok(id);
  }

  let Some(linked) = store
    .get_user(user_id)
    .await
    .map_err(Error::store)?
    .and_then(|user| user.school_id)
  else {
    return Err(Error::NoOwnedSchool(user_id));
  };

  let Some(school) = store.get_school(linked).await.map_err(Error::store)?
  else {
    return Err(Error::NoOwnedSchool(user_id));
  };

  if school.owner_user_id.is_none() {
    match store.link_owner(school.id, user_id).await {
      Ok(true) => {
        tracing::info!(school_id = school.id, user_id, "linked school owner");
      }
      Ok(false) => {
        tracing::warn!(
          school_id = school.id,
          user_id,
          "owner link skipped: school was claimed concurrently"
        );
      }
      Err(e) => {
        tracing::warn!(
          school_id = school.id,
          user_id,
          error = %e,
          "failed to link school owner"
        );
      }
    }
  }

  Ok(school.id)
}
