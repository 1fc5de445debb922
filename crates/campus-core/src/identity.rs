//! Authenticated callers.
//!
//! An [`Identity`] is produced by the authentication collaborator once a
//! credential has been verified; the core treats it as an opaque triple.

use serde::{Deserialize, Serialize};

use crate::school::UserId;

/// What an authenticated caller is allowed to act as.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  School,
  Parent,
  Admin,
}

impl Role {
  /// Map a role claim to a [`Role`].
  ///
  /// Older tokens carry `student` for parents and `super_admin` for the
  /// platform operators; both are folded into the current roles.
  pub fn from_claim(claim: &str) -> Option<Self> {
    match claim.trim().to_ascii_lowercase().as_str() {
      "school" => Some(Self::School),
      "parent" | "student" => Some(Self::Parent),
      "admin" | "super_admin" => Some(Self::Admin),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id: UserId,
  pub email:   String,
  pub role:    Role,
}
