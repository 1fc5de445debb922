//! Admission enquiries sent to a school, and the lead list its administrator
//! works through.
//!
//! Anyone may submit an enquiry; a `parent` token additionally ties it to
//! the parent's account so they can follow it. Administrators see only the
//! enquiries of the school [`resolve_owned_school`] finds for them.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  identity::{Identity, Role},
  owner::resolve_owned_school,
  school::{SchoolId, UserId},
  store::SchoolStore,
};

pub type EnquiryId = i64;

/// Default page size for enquiry listings.
pub const DEFAULT_ENQUIRY_LIMIT: usize = 20;
/// Largest enquiry page a caller may request.
pub const MAX_ENQUIRY_LIMIT: usize = 100;

/// Where a lead stands in the school's follow-up process.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
pub enum EnquiryStatus {
  #[default]
  New,
  #[serde(rename = "In Progress")]
  #[strum(serialize = "In Progress")]
  InProgress,
  Converted,
  Lost,
}

impl EnquiryStatus {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// A dated follow-up note left by the school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquiryNote {
  #[serde(rename = "date")]
  pub at:   DateTime<Utc>,
  pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
  pub id:             EnquiryId,
  pub school_id:      SchoolId,
  /// Set when the enquiry was sent with a `parent` token.
  pub parent_user_id: Option<UserId>,
  pub student_name:   String,
  pub student_email:  String,
  pub student_phone:  String,
  pub student_class:  String,
  pub message:        Option<String>,
  pub status:         EnquiryStatus,
  /// Oldest first.
  pub notes:          Vec<EnquiryNote>,
  pub follow_up_date: Option<NaiveDate>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// Body of an enquiry submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryRequest {
  pub school_id:     Option<SchoolId>,
  pub student_name:  Option<String>,
  pub student_email: Option<String>,
  pub student_phone: Option<String>,
  pub student_class: Option<String>,
  pub message:       Option<String>,
}

/// Validated input to [`SchoolStore::insert_enquiry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnquiry {
  pub school_id:      SchoolId,
  pub parent_user_id: Option<UserId>,
  pub student_name:   String,
  pub student_email:  String,
  pub student_phone:  String,
  pub student_class:  String,
  pub message:        Option<String>,
}

fn required(field: &'static str, value: Option<&str>) -> Result<String> {
  value
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_owned)
    .ok_or_else(|| Error::validation(format!("{field} is required")))
}

/// `local@domain.tld` with no whitespace.
fn looks_like_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && !email.chars().any(char::is_whitespace)
    && domain
      .split_once('.')
      .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    && !domain.ends_with('.')
}

impl EnquiryRequest {
  /// Validate and attach the sender. Only a `parent` caller is recorded.
  pub fn into_new(self, caller: Option<&Identity>) -> Result<NewEnquiry> {
    let school_id = self
      .school_id
      .ok_or_else(|| Error::validation("schoolId is required"))?;
    let student_name = required("studentName", self.student_name.as_deref())?;
    let student_email =
      required("studentEmail", self.student_email.as_deref())?.to_lowercase();
    let student_phone = required("studentPhone", self.student_phone.as_deref())?;
    let student_class = required("studentClass", self.student_class.as_deref())?;

    if !looks_like_email(&student_email) {
      return Err(Error::validation(format!(
        "studentEmail is not a valid address: {student_email:?}"
      )));
    }

    Ok(NewEnquiry {
      school_id,
      parent_user_id: caller
        .filter(|identity| identity.role == Role::Parent)
        .map(|identity| identity.user_id),
      student_name,
      student_email,
      student_phone,
      student_class,
      message: self
        .message
        .map(|m| m.trim().to_owned())
        .filter(|m| !m.is_empty()),
    })
  }
}

/// Record an enquiry for an existing school.
pub async fn submit_enquiry<S: SchoolStore>(
  store: &S,
  caller: Option<&Identity>,
  request: EnquiryRequest,
) -> Result<Enquiry> {
  let input = request.into_new(caller)?;
  let school_id = input.school_id;

  if store
    .get_school(school_id)
    .await
    .map_err(Error::store)?
    .is_none()
  {
    return Err(Error::SchoolNotFound(school_id));
  }

  let enquiry = store.insert_enquiry(input).await.map_err(Error::store)?;
  tracing::info!(enquiry_id = enquiry.id, school_id, "enquiry received");
  Ok(enquiry)
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// Whose enquiries a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnquiryScope {
  School(SchoolId),
  Parent(UserId),
}

/// Filters for listing enquiries, newest first.
#[derive(Debug, Clone)]
pub struct EnquiryQuery {
  pub scope:         EnquiryScope,
  pub status:        Option<EnquiryStatus>,
  /// Exact class label, case-insensitive.
  pub student_class: Option<String>,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

impl EnquiryQuery {
  pub fn new(scope: EnquiryScope) -> Self {
    Self {
      scope,
      status: None,
      student_class: None,
      limit: None,
      offset: None,
    }
  }

  pub fn effective_limit(&self) -> usize {
    self
      .limit
      .unwrap_or(DEFAULT_ENQUIRY_LIMIT)
      .clamp(1, MAX_ENQUIRY_LIMIT)
  }

  pub fn effective_offset(&self) -> usize { self.offset.unwrap_or(0) }
}

/// Caller-supplied listing filters, before a scope is attached.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryFilter {
  pub status:        Option<EnquiryStatus>,
  pub student_class: Option<String>,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

impl EnquiryFilter {
  pub fn scoped(self, scope: EnquiryScope) -> EnquiryQuery {
    EnquiryQuery {
      scope,
      status: self.status,
      student_class: self
        .student_class
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty()),
      limit: self.limit,
      offset: self.offset,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadMetadata {
  /// Matches for the filters, across all pages.
  pub total:            u64,
  pub limit:            usize,
  pub offset:           usize,
  pub has_more:         bool,
  /// Every enquiry of the school by status, ignoring the filters.
  pub status_breakdown: BTreeMap<EnquiryStatus, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadPage {
  pub enquiries: Vec<Enquiry>,
  pub metadata:  LeadMetadata,
}

/// One page of the administrator's leads.
pub async fn list_leads<S: SchoolStore>(
  store: &S,
  identity: &Identity,
  filter: EnquiryFilter,
) -> Result<LeadPage> {
  let school_id = resolve_owned_school(store, identity).await?;
  let query = filter.scoped(EnquiryScope::School(school_id));

  let enquiries = store.list_enquiries(&query).await.map_err(Error::store)?;
  let total = store.count_enquiries(&query).await.map_err(Error::store)?;
  let status_breakdown = store
    .enquiry_status_counts(school_id)
    .await
    .map_err(Error::store)?;

  let offset = query.effective_offset();
  let has_more = ((offset + enquiries.len()) as u64) < total;
  Ok(LeadPage {
    metadata: LeadMetadata {
      total,
      limit: query.effective_limit(),
      offset,
      has_more,
      status_breakdown,
    },
    enquiries,
  })
}

/// Contact details of the school an enquiry went to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolContact {
  pub name:          String,
  pub city:          String,
  pub contact_email: Option<String>,
  pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentEnquiry {
  #[serde(flatten)]
  pub enquiry: Enquiry,
  /// `None` when the school has since been removed.
  pub school:  Option<SchoolContact>,
}

/// The enquiries a parent has sent, with the schools' contact details.
pub async fn list_sent_enquiries<S: SchoolStore>(
  store: &S,
  identity: &Identity,
  filter: EnquiryFilter,
) -> Result<Vec<SentEnquiry>> {
  if identity.role != Role::Parent {
    return Err(Error::ForbiddenRole(identity.role));
  }
  let query = filter.scoped(EnquiryScope::Parent(identity.user_id));
  let enquiries = store.list_enquiries(&query).await.map_err(Error::store)?;

  let mut ids: Vec<SchoolId> = enquiries.iter().map(|e| e.school_id).collect();
  ids.sort_unstable();
  ids.dedup();
  let schools = store.get_schools(&ids).await.map_err(Error::store)?;

  Ok(
    enquiries
      .into_iter()
      .map(|enquiry| {
        let school = schools
          .iter()
          .find(|s| s.id == enquiry.school_id)
          .map(|s| SchoolContact {
            name:          s.name.clone(),
            city:          s.city.clone(),
            contact_email: s.contact_email.clone(),
            contact_phone: s.contact_phone.clone(),
          });
        SentEnquiry { enquiry, school }
      })
      .collect(),
  )
}

// ─── Follow-up ───────────────────────────────────────────────────────────────

/// Body of a lead update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdate {
  pub status:         Option<EnquiryStatus>,
  /// Appended to the notes with the current time.
  pub note:           Option<String>,
  pub follow_up_date: Option<NaiveDate>,
}

/// Validated writes for [`SchoolStore::update_enquiry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnquiryChanges {
  pub status:         Option<EnquiryStatus>,
  /// The complete new note list.
  pub notes:          Option<Vec<EnquiryNote>>,
  pub follow_up_date: Option<NaiveDate>,
}

impl EnquiryChanges {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

impl LeadUpdate {
  pub fn validate(&self) -> Result<()> {
    if self.note.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::validation("note must not be empty"));
    }
    Ok(())
  }

  pub fn into_changes(self, current: &Enquiry, now: DateTime<Utc>) -> Result<EnquiryChanges> {
    self.validate()?;
    let notes = self.note.map(|text| {
      let mut notes = current.notes.clone();
      notes.push(EnquiryNote { at: now, text: text.trim().to_owned() });
      notes
    });
    Ok(EnquiryChanges {
      status: self.status.filter(|s| *s != current.status),
      notes,
      follow_up_date: self.follow_up_date,
    })
  }
}

/// Apply `update` to one of the administrator's leads.
///
/// Enquiries of other schools are reported as not found.
pub async fn update_lead<S: SchoolStore>(
  store: &S,
  identity: &Identity,
  enquiry_id: EnquiryId,
  update: LeadUpdate,
) -> Result<Enquiry> {
  update.validate()?;
  let school_id = resolve_owned_school(store, identity).await?;

  let current = store
    .get_enquiry(enquiry_id)
    .await
    .map_err(Error::store)?
    .filter(|e| e.school_id == school_id)
    .ok_or(Error::EnquiryNotFound(enquiry_id))?;

  let changes = update.into_changes(&current, Utc::now())?;
  if changes.is_empty() {
    return Ok(current);
  }
  if let Some(status) = changes.status {
    tracing::info!(
      enquiry_id,
      school_id,
      from = current.status.as_str(),
      to = status.as_str(),
      "lead status changed"
    );
  }

  if !store
    .update_enquiry(enquiry_id, changes)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::EnquiryNotFound(enquiry_id));
  }
  store
    .get_enquiry(enquiry_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::EnquiryNotFound(enquiry_id))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::{
    mock::MockStore,
    school::{UserRecord, test_school},
  };

  fn request(body: serde_json::Value) -> EnquiryRequest {
    serde_json::from_value(body).unwrap()
  }

  fn full_request(school_id: SchoolId) -> EnquiryRequest {
    request(json!({
      "schoolId": school_id,
      "studentName": " Asha ",
      "studentEmail": "Parent@Example.com",
      "studentPhone": "98200 00000",
      "studentClass": "class5",
      "message": "   "
    }))
  }

  fn identity(user_id: UserId, role: Role) -> Identity {
    Identity { user_id, email: format!("u{user_id}@example.com"), role }
  }

  /// School 7 administered by user 42.
  fn store_with_admin() -> MockStore {
    let store = MockStore::default();
    let mut school = test_school(7);
    school.owner_user_id = Some(42);
    store.put_school(school);
    store.put_school(test_school(8));
    store.put_user(UserRecord {
      id:         42,
      email:      "head@school.in".into(),
      role:       Role::School,
      school_id:  Some(7),
      created_at: Utc::now(),
    });
    store
  }

  #[test]
  fn status_wire_names() {
    assert_eq!(EnquiryStatus::InProgress.as_str(), "In Progress");
    assert_eq!("Lost".parse::<EnquiryStatus>().unwrap(), EnquiryStatus::Lost);
    assert_eq!(
      serde_json::to_value(EnquiryStatus::InProgress).unwrap(),
      json!("In Progress")
    );
    assert!("Pending".parse::<EnquiryStatus>().is_err());
  }

  #[test]
  fn request_is_trimmed_and_lowercased() {
    let parent = identity(5, Role::Parent);
    let input = full_request(7).into_new(Some(&parent)).unwrap();
    assert_eq!(input.student_name, "Asha");
    assert_eq!(input.student_email, "parent@example.com");
    assert_eq!(input.parent_user_id, Some(5));
    assert_eq!(input.message, None);
  }

  #[test]
  fn only_parents_are_recorded_as_sender() {
    let admin = identity(42, Role::School);
    let input = full_request(7).into_new(Some(&admin)).unwrap();
    assert_eq!(input.parent_user_id, None);
    assert_eq!(full_request(7).into_new(None).unwrap().parent_user_id, None);
  }

  #[test]
  fn missing_fields_are_named() {
    let err = request(json!({ "schoolId": 7, "studentName": "A" }))
      .into_new(None)
      .unwrap_err();
    assert!(matches!(&err, Error::Validation(m) if m.contains("studentEmail")));

    let err = request(json!({ "studentName": "A" })).into_new(None).unwrap_err();
    assert!(matches!(&err, Error::Validation(m) if m.contains("schoolId")));
  }

  #[test]
  fn email_shape_is_checked() {
    for bad in ["plain", "a@b", "@b.com", "a b@c.com", "a@b.", "a@@b.com"] {
      assert!(!looks_like_email(bad), "{bad}");
    }
    assert!(looks_like_email("a.b@school.co.in"));
  }

  #[test]
  fn limit_is_clamped() {
    let mut query = EnquiryQuery::new(EnquiryScope::School(1));
    assert_eq!(query.effective_limit(), DEFAULT_ENQUIRY_LIMIT);
    query.limit = Some(1000);
    assert_eq!(query.effective_limit(), MAX_ENQUIRY_LIMIT);
    query.limit = Some(0);
    assert_eq!(query.effective_limit(), 1);
  }

  #[tokio::test]
  async fn enquiry_for_unknown_school_is_rejected() {
    let store = MockStore::default();
    assert!(matches!(
      submit_enquiry(&store, None, full_request(99)).await,
      Err(Error::SchoolNotFound(99))
    ));
  }

  #[tokio::test]
  async fn invalid_enquiry_never_touches_storage() {
    let store = MockStore::default();
    let result = submit_enquiry(&store, None, EnquiryRequest::default()).await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn leads_are_scoped_to_the_resolved_school() {
    let store = store_with_admin();
    for school_id in [7, 7, 8] {
      submit_enquiry(&store, None, full_request(school_id)).await.unwrap();
    }

    let page = list_leads(&store, &identity(42, Role::School), EnquiryFilter {
      limit: Some(1),
      ..EnquiryFilter::default()
    })
    .await
    .unwrap();
    assert_eq!(page.enquiries.len(), 1);
    assert!(page.enquiries.iter().all(|e| e.school_id == 7));
    assert_eq!(page.metadata.total, 2);
    assert!(page.metadata.has_more);
    assert_eq!(page.metadata.status_breakdown[&EnquiryStatus::New], 2);
  }

  #[tokio::test]
  async fn leads_need_school_role() {
    let store = store_with_admin();
    let result =
      list_leads(&store, &identity(42, Role::Parent), EnquiryFilter::default()).await;
    assert!(matches!(result, Err(Error::ForbiddenRole(Role::Parent))));
  }

  #[tokio::test]
  async fn update_appends_note_and_sets_status() {
    let store = store_with_admin();
    let enquiry = submit_enquiry(&store, None, full_request(7)).await.unwrap();

    let admin = identity(42, Role::School);
    let updated = update_lead(&store, &admin, enquiry.id, LeadUpdate {
      status: Some(EnquiryStatus::InProgress),
      note: Some(" called back ".into()),
      ..LeadUpdate::default()
    })
    .await
    .unwrap();
    assert_eq!(updated.status, EnquiryStatus::InProgress);
    assert_eq!(updated.notes.len(), 1);
    assert_eq!(updated.notes[0].text, "called back");

    let updated = update_lead(&store, &admin, enquiry.id, LeadUpdate {
      note: Some("visit booked".into()),
      ..LeadUpdate::default()
    })
    .await
    .unwrap();
    let texts: Vec<&str> = updated.notes.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(texts, ["called back", "visit booked"]);
    assert_eq!(updated.status, EnquiryStatus::InProgress);
  }

  #[tokio::test]
  async fn other_schools_leads_are_not_found() {
    let store = store_with_admin();
    let foreign = submit_enquiry(&store, None, full_request(8)).await.unwrap();

    let result = update_lead(&store, &identity(42, Role::School), foreign.id, LeadUpdate {
      status: Some(EnquiryStatus::Lost),
      ..LeadUpdate::default()
    })
    .await;
    assert!(matches!(result, Err(Error::EnquiryNotFound(id)) if id == foreign.id));
    assert_eq!(
      store.enquiry(foreign.id).unwrap().status,
      EnquiryStatus::New
    );
  }

  #[tokio::test]
  async fn parents_see_their_enquiries_with_school_contact() {
    let store = store_with_admin();
    let parent = identity(5, Role::Parent);
    submit_enquiry(&store, Some(&parent), full_request(7)).await.unwrap();
    submit_enquiry(&store, None, full_request(8)).await.unwrap();

    let sent = list_sent_enquiries(&store, &parent, EnquiryFilter::default())
      .await
      .unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].school.as_ref().unwrap().name, "School 7");

    let admin = identity(42, Role::School);
    assert!(matches!(
      list_sent_enquiries(&store, &admin, EnquiryFilter::default()).await,
      Err(Error::ForbiddenRole(Role::School))
    ));
  }
}
