//! In-memory [`SchoolStore`] for unit tests. Counts every call and can be
//! told to fail.

use std::{
  collections::BTreeMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use chrono::Utc;

use crate::{
  enquiry::{
    Enquiry, EnquiryChanges, EnquiryId, EnquiryQuery, EnquiryScope, EnquiryStatus,
    NewEnquiry,
  },
  media::MediaList,
  profile::{ProfileChanges, TextField},
  school::{NewSchool, NewUser, SchoolId, SchoolProfile, UserId, UserRecord, test_school},
  store::{SchoolQuery, SchoolStore},
};

#[derive(Debug, thiserror::Error)]
#[error("injected failure in {0}")]
pub struct MockError(&'static str);

#[derive(Default)]
pub struct MockStore {
  schools:         Mutex<BTreeMap<SchoolId, SchoolProfile>>,
  users:           Mutex<BTreeMap<UserId, UserRecord>>,
  enquiries:       Mutex<BTreeMap<EnquiryId, Enquiry>>,
  calls:           AtomicUsize,
  fail_reads:      AtomicBool,
  fail_link_owner: AtomicBool,
}

impl MockStore {
  pub fn put_school(&self, school: SchoolProfile) {
    self.schools.lock().unwrap().insert(school.id, school);
  }

  pub fn put_user(&self, user: UserRecord) {
    self.users.lock().unwrap().insert(user.id, user);
  }

  pub fn school(&self, id: SchoolId) -> Option<SchoolProfile> {
    self.schools.lock().unwrap().get(&id).cloned()
  }

  pub fn enquiry(&self, id: EnquiryId) -> Option<Enquiry> {
    self.enquiries.lock().unwrap().get(&id).cloned()
  }

  /// Enquiries matching `query`, newest first, before paging.
  fn matching(&self, query: &EnquiryQuery) -> Vec<Enquiry> {
    let mut found: Vec<Enquiry> = self
      .enquiries
      .lock()
      .unwrap()
      .values()
      .filter(|e| match query.scope {
        EnquiryScope::School(id) => e.school_id == id,
        EnquiryScope::Parent(id) => e.parent_user_id == Some(id),
      })
      .filter(|e| query.status.is_none_or(|s| e.status == s))
      .filter(|e| {
        query
          .student_class
          .as_deref()
          .is_none_or(|c| e.student_class.eq_ignore_ascii_case(c))
      })
      .cloned()
      .collect();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    found
  }

  /// Total number of trait calls so far.
  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  pub fn fail_reads(&self) { self.fail_reads.store(true, Ordering::SeqCst); }

  pub fn fail_link_owner(&self) {
    self.fail_link_owner.store(true, Ordering::SeqCst);
  }

  fn enter(&self, op: &'static str) -> Result<(), MockError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(MockError(op));
    }
    Ok(())
  }

  fn mutate(
    &self,
    id: SchoolId,
    f: impl FnOnce(&mut SchoolProfile),
  ) -> bool {
    let mut schools = self.schools.lock().unwrap();
    let Some(school) = schools.get_mut(&id) else {
      return false;
    };
    f(school);
    school.updated_at = Utc::now();
    true
  }
}

fn set_text(school: &mut SchoolProfile, field: TextField, value: Option<String>) {
  match field {
    TextField::Name => school.name = value.unwrap_or_default(),
    TextField::Board => school.board = value.unwrap_or_default(),
    TextField::City => school.city = value.unwrap_or_default(),
    TextField::Address => school.address = value,
    TextField::State => school.state = value,
    TextField::Pincode => school.pincode = value,
    TextField::Description => school.description = value,
    TextField::ContactEmail => school.contact_email = value,
    TextField::ContactPhone => school.contact_phone = value,
    TextField::Website => school.website = value,
    TextField::SchoolType => school.school_type = value,
  }
}

impl SchoolStore for MockStore {
  type Error = MockError;

  async fn insert_school(&self, input: NewSchool) -> Result<SchoolProfile, MockError> {
    self.enter("insert_school")?;
    let mut schools = self.schools.lock().unwrap();
    let id = schools.keys().next_back().map_or(1, |last| last + 1);
    let mut school = test_school(id);
    school.name = input.name;
    school.board = input.board;
    school.city = input.city;
    school.owner_user_id = input.owner_user_id;
    schools.insert(id, school.clone());
    Ok(school)
  }

  async fn insert_user(&self, input: NewUser) -> Result<UserRecord, MockError> {
    self.enter("insert_user")?;
    let mut users = self.users.lock().unwrap();
    let id = users.keys().next_back().map_or(1, |last| last + 1);
    let user = UserRecord {
      id,
      email: input.email,
      role: input.role,
      school_id: input.school_id,
      created_at: Utc::now(),
    };
    users.insert(id, user.clone());
    Ok(user)
  }

  async fn get_school(&self, id: SchoolId) -> Result<Option<SchoolProfile>, MockError> {
    self.enter("get_school")?;
    Ok(self.school(id))
  }

  async fn find_school_id_by_owner(
    &self,
    user_id: UserId,
  ) -> Result<Option<SchoolId>, MockError> {
    self.enter("find_school_id_by_owner")?;
    let schools = self.schools.lock().unwrap();
    Ok(
      schools
        .values()
        .find(|s| s.owner_user_id == Some(user_id))
        .map(|s| s.id),
    )
  }

  async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, MockError> {
    self.enter("get_user")?;
    Ok(self.users.lock().unwrap().get(&id).cloned())
  }

  async fn link_owner(
    &self,
    school_id: SchoolId,
    user_id: UserId,
  ) -> Result<bool, MockError> {
    self.enter("link_owner")?;
    if self.fail_link_owner.load(Ordering::SeqCst) {
      return Err(MockError("link_owner"));
    }
    let mut schools = self.schools.lock().unwrap();
    match schools.get_mut(&school_id) {
      Some(school) if school.owner_user_id.is_none() => {
        school.owner_user_id = Some(user_id);
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn replace_media(
    &self,
    school_id: SchoolId,
    list: MediaList,
    urls: Vec<String>,
  ) -> Result<bool, MockError> {
    self.enter("replace_media")?;
    Ok(self.mutate(school_id, |school| match list {
      MediaList::VirtualTourVideos => school.virtual_tour_videos = urls,
      MediaList::GalleryImages => school.gallery_images = urls,
    }))
  }

  async fn update_profile(
    &self,
    school_id: SchoolId,
    changes: ProfileChanges,
  ) -> Result<bool, MockError> {
    self.enter("update_profile")?;
    Ok(self.mutate(school_id, |school| {
      for (field, value) in changes.text {
        set_text(school, field, value);
      }
      if let Some(year) = changes.establishment_year {
        school.establishment_year = Some(year);
      }
      if let Some(flags) = changes.facility_flags {
        school.facility_flags = flags;
      }
      if let Some(facilities) = changes.facilities {
        school.facilities = facilities;
      }
      if let Some((fees, range)) = changes.fees {
        school.fees_structure = fees;
        school.fees_min = range.min;
        school.fees_max = range.max;
      }
      if let Some(images) = changes.facility_images {
        school.facility_images = images;
      }
      if let Some(awards) = changes.awards {
        school.awards = awards;
      }
    }))
  }

  async fn record_profile_view(&self, school_id: SchoolId) -> Result<(), MockError> {
    self.enter("record_profile_view")?;
    if let Some(school) = self.schools.lock().unwrap().get_mut(&school_id) {
      school.profile_views += 1;
    }
    Ok(())
  }

  async fn list_schools(
    &self,
    query: &SchoolQuery,
  ) -> Result<Vec<SchoolProfile>, MockError> {
    self.enter("list_schools")?;
    Ok(
      self
        .schools
        .lock()
        .unwrap()
        .values()
        .skip(query.effective_offset())
        .take(query.effective_limit())
        .cloned()
        .collect(),
    )
  }

  async fn get_schools(
    &self,
    ids: &[SchoolId],
  ) -> Result<Vec<SchoolProfile>, MockError> {
    self.enter("get_schools")?;
    Ok(ids.iter().filter_map(|id| self.school(*id)).collect())
  }

  async fn insert_enquiry(&self, input: NewEnquiry) -> Result<Enquiry, MockError> {
    self.enter("insert_enquiry")?;
    let mut enquiries = self.enquiries.lock().unwrap();
    let id = enquiries.keys().next_back().map_or(1, |last| last + 1);
    let now = Utc::now();
    let enquiry = Enquiry {
      id,
      school_id: input.school_id,
      parent_user_id: input.parent_user_id,
      student_name: input.student_name,
      student_email: input.student_email,
      student_phone: input.student_phone,
      student_class: input.student_class,
      message: input.message,
      status: EnquiryStatus::New,
      notes: Vec::new(),
      follow_up_date: None,
      created_at: now,
      updated_at: now,
    };
    enquiries.insert(id, enquiry.clone());
    Ok(enquiry)
  }

  async fn get_enquiry(&self, id: EnquiryId) -> Result<Option<Enquiry>, MockError> {
    self.enter("get_enquiry")?;
    Ok(self.enquiry(id))
  }

  async fn list_enquiries(
    &self,
    query: &EnquiryQuery,
  ) -> Result<Vec<Enquiry>, MockError> {
    self.enter("list_enquiries")?;
    Ok(
      self
        .matching(query)
        .into_iter()
        .skip(query.effective_offset())
        .take(query.effective_limit())
        .collect(),
    )
  }

  async fn count_enquiries(&self, query: &EnquiryQuery) -> Result<u64, MockError> {
    self.enter("count_enquiries")?;
    Ok(self.matching(query).len() as u64)
  }

  async fn enquiry_status_counts(
    &self,
    school_id: SchoolId,
  ) -> Result<BTreeMap<EnquiryStatus, u64>, MockError> {
    self.enter("enquiry_status_counts")?;
    let mut counts = BTreeMap::new();
    for enquiry in self.enquiries.lock().unwrap().values() {
      if enquiry.school_id == school_id {
        *counts.entry(enquiry.status).or_insert(0) += 1;
      }
    }
    Ok(counts)
  }

  async fn update_enquiry(
    &self,
    id: EnquiryId,
    changes: EnquiryChanges,
  ) -> Result<bool, MockError> {
    self.enter("update_enquiry")?;
    let mut enquiries = self.enquiries.lock().unwrap();
    let Some(enquiry) = enquiries.get_mut(&id) else {
      return Ok(false);
    };
    if let Some(status) = changes.status {
      enquiry.status = status;
    }
    if let Some(notes) = changes.notes {
      enquiry.notes = notes;
    }
    if let Some(date) = changes.follow_up_date {
      enquiry.follow_up_date = Some(date);
    }
    enquiry.updated_at = Utc::now();
    Ok(true)
  }
}
