//! Ordered-set media lists on a school profile (virtual-tour videos, gallery
//! images and the per-facility image lists).
//!
//! Each list lives in a single JSON column. Appends are idempotent: a URL
//! that is already present is skipped. Removing a URL that is not present is
//! an error, so a stale client notices.

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

use crate::{
  Error, Result,
  profile::ProfileChanges,
  school::{SchoolId, SchoolProfile},
  store::SchoolStore,
};

/// Which media list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaList {
  VirtualTourVideos,
  GalleryImages,
}

impl MediaList {
  /// Human-readable noun used in messages.
  pub fn label(self) -> &'static str {
    match self {
      Self::VirtualTourVideos => "video",
      Self::GalleryImages => "image",
    }
  }

  /// Request field carrying a single URL.
  pub fn single_field(self) -> &'static str {
    match self {
      Self::VirtualTourVideos => "videoUrl",
      Self::GalleryImages => "imageUrl",
    }
  }

  /// Request field carrying a list of URLs.
  pub fn list_field(self) -> &'static str {
    match self {
      Self::VirtualTourVideos => "videoUrls",
      Self::GalleryImages => "imageUrls",
    }
  }

  /// Gallery edits belong to the profile sections that need basic info.
  fn requires_basic_info(self) -> bool { matches!(self, Self::GalleryImages) }

  pub fn entries(self, school: &SchoolProfile) -> &[String] {
    match self {
      Self::VirtualTourVideos => &school.virtual_tour_videos,
      Self::GalleryImages => &school.gallery_images,
    }
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// URLs to append, as supplied by a caller: a single value, a list, or both.
#[derive(Debug, Clone, Default)]
pub struct MediaInput {
  pub single: Option<String>,
  pub many:   Option<Vec<String>>,
}

impl MediaInput {
  /// Trim and validate the supplied URLs, single value first.
  ///
  /// Any value that is empty after trimming is rejected by name. At least
  /// one URL must be supplied across both forms.
  pub fn into_urls(self, list: MediaList) -> Result<Vec<String>> {
    let mut urls = Vec::new();

    if let Some(single) = self.single {
      let trimmed = single.trim();
      if trimmed.is_empty() {
        return Err(Error::validation(format!(
          "{} must not be empty",
          list.single_field()
        )));
      }
      urls.push(trimmed.to_owned());
    }

    for (index, url) in self.many.unwrap_or_default().into_iter().enumerate() {
      let trimmed = url.trim();
      if trimmed.is_empty() {
        return Err(Error::validation(format!(
          "{}[{index}] must not be empty",
          list.list_field()
        )));
      }
      urls.push(trimmed.to_owned());
    }

    if urls.is_empty() {
      return Err(Error::validation(format!(
        "either {} or {} must be provided",
        list.single_field(),
        list.list_field()
      )));
    }
    Ok(urls)
  }
}

/// Trim and validate a URL to remove.
pub fn removal_target(list: MediaList, url: &str) -> Result<String> {
  let trimmed = url.trim();
  if trimmed.is_empty() {
    return Err(Error::validation(format!(
      "{} is required",
      list.single_field()
    )));
  }
  Ok(trimmed.to_owned())
}

// ─── List arithmetic ─────────────────────────────────────────────────────────

/// Append every URL not already present, keeping first-occurrence order.
pub fn merge_unique(existing: &[String], incoming: &[String]) -> Vec<String> {
  let mut merged: Vec<String> = Vec::with_capacity(existing.len() + incoming.len());
  for url in existing.iter().chain(incoming) {
    if !merged.contains(url) {
      merged.push(url.clone());
    }
  }
  merged
}

/// Drop every occurrence of `url`. Returns `None` if it was not present.
pub fn without(existing: &[String], url: &str) -> Option<Vec<String>> {
  let kept: Vec<String> =
    existing.iter().filter(|u| *u != url).cloned().collect();
  (kept.len() != existing.len()).then_some(kept)
}

// ─── Operations ──────────────────────────────────────────────────────────────

async fn load<S: SchoolStore>(store: &S, school_id: SchoolId) -> Result<SchoolProfile> {
  store
    .get_school(school_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::SchoolNotFound(school_id))
}

fn require_basic_info(school: &SchoolProfile) -> Result<()> {
  let missing = school.missing_basic_info();
  if !missing.is_empty() {
    return Err(Error::validation(format!(
      "complete basic info first: missing {}",
      missing.join(", ")
    )));
  }
  Ok(())
}

async fn write<S: SchoolStore>(
  store: &S,
  school_id: SchoolId,
  list: MediaList,
  urls: Vec<String>,
) -> Result<SchoolProfile> {
  if !store
    .replace_media(school_id, list, urls)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::SchoolNotFound(school_id));
  }
  load(store, school_id).await
}

/// Union `urls` into the school's list and return the updated profile.
///
/// `urls` must already be validated (see [`MediaInput::into_urls`]).
pub async fn add_media<S: SchoolStore>(
  store: &S,
  school_id: SchoolId,
  list: MediaList,
  urls: &[String],
) -> Result<SchoolProfile> {
  let school = load(store, school_id).await?;

  if list.requires_basic_info() {
    require_basic_info(&school)?;
  }

  let merged = merge_unique(list.entries(&school), urls);
  if merged.len() == list.entries(&school).len() {
    tracing::debug!(school_id, list = list.label(), "append was a no-op");
  }
  write(store, school_id, list, merged).await
}

/// Remove `url` from the school's list and return the updated profile.
pub async fn remove_media<S: SchoolStore>(
  store: &S,
  school_id: SchoolId,
  list: MediaList,
  url: &str,
) -> Result<SchoolProfile> {
  let school = load(store, school_id).await?;
  let remaining = without(list.entries(&school), url).ok_or_else(|| {
    Error::MediaNotFound {
      list,
      url: url.to_owned(),
    }
  })?;
  write(store, school_id, list, remaining).await
}

// ─── Facility images ─────────────────────────────────────────────────────────

/// Trim and validate the facility an image edit targets.
pub fn facility_target(name: Option<&str>) -> Result<String> {
  name
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .map(str::to_owned)
    .ok_or_else(|| Error::validation("facilityName is required"))
}

async fn write_facility_images<S: SchoolStore>(
  store: &S,
  school_id: SchoolId,
  images: BTreeMap<String, Vec<String>>,
) -> Result<SchoolProfile> {
  let changes = ProfileChanges {
    facility_images: Some(images),
    ..ProfileChanges::default()
  };
  if !store
    .update_profile(school_id, changes)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::SchoolNotFound(school_id));
  }
  load(store, school_id).await
}

/// Union `urls` into the images of one facility and return the updated
/// profile. Like the other profile sections, needs complete basic info.
pub async fn add_facility_images<S: SchoolStore>(
  store: &S,
  school_id: SchoolId,
  facility: &str,
  urls: &[String],
) -> Result<SchoolProfile> {
  let school = load(store, school_id).await?;
  require_basic_info(&school)?;

  let mut images = school.facility_images;
  let existing = images.get(facility).map(Vec::as_slice).unwrap_or_default();
  let merged = merge_unique(existing, urls);
  images.insert(facility.to_owned(), merged);
  write_facility_images(store, school_id, images).await
}

/// Remove `url` from one facility's images. A facility left with no images
/// is dropped from the map.
pub async fn remove_facility_image<S: SchoolStore>(
  store: &S,
  school_id: SchoolId,
  facility: &str,
  url: &str,
) -> Result<SchoolProfile> {
  let school = load(store, school_id).await?;

  let mut images = school.facility_images;
  let remaining = images
    .get(facility)
    .and_then(|urls| without(urls, url))
    .ok_or_else(|| Error::FacilityImageNotFound {
      facility: facility.to_owned(),
      url:      url.to_owned(),
    })?;
  if remaining.is_empty() {
    images.remove(facility);
  } else {
    images.insert(facility.to_owned(), remaining);
  }
  write_facility_images(store, school_id, images).await
}

#[cfg(test)]
mod tests {
  use super::*;

  fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
  }

  #[test]
  fn input_is_trimmed_and_ordered() {
    let input = MediaInput {
      single: Some("  https://a.mp4 ".into()),
      many:   Some(strings(&["https://b.mp4", " https://c.mp4"])),
    };
    assert_eq!(
      input.into_urls(MediaList::VirtualTourVideos).unwrap(),
      strings(&["https://a.mp4", "https://b.mp4", "https://c.mp4"])
    );
  }

  #[test]
  fn empty_value_is_named() {
    let input = MediaInput {
      single: None,
      many:   Some(strings(&["https://a.mp4", "   "])),
    };
    let err = input.into_urls(MediaList::VirtualTourVideos).unwrap_err();
    assert!(
      matches!(&err, Error::Validation(m) if m.contains("videoUrls[1]")),
      "{err}"
    );

    let input = MediaInput { single: Some(" ".into()), many: None };
    let err = input.into_urls(MediaList::GalleryImages).unwrap_err();
    assert!(matches!(&err, Error::Validation(m) if m.contains("imageUrl")));
  }

  #[test]
  fn nothing_supplied_is_rejected() {
    assert!(matches!(
      MediaInput::default().into_urls(MediaList::VirtualTourVideos),
      Err(Error::Validation(_))
    ));
    let input = MediaInput { single: None, many: Some(Vec::new()) };
    assert!(matches!(
      input.into_urls(MediaList::VirtualTourVideos),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn merge_keeps_first_occurrence_order() {
    let existing = strings(&["a", "b"]);
    let incoming = strings(&["c", "a", "d", "c"]);
    assert_eq!(merge_unique(&existing, &incoming), strings(&["a", "b", "c", "d"]));
  }

  #[test]
  fn merge_twice_is_merge_once() {
    let existing = strings(&["a"]);
    let once = merge_unique(&existing, &strings(&["b"]));
    let twice = merge_unique(&once, &strings(&["b"]));
    assert_eq!(once, twice);
  }

  #[test]
  fn without_reports_missing() {
    let existing = strings(&["a", "b"]);
    assert_eq!(without(&existing, "a"), Some(strings(&["b"])));
    assert_eq!(without(&existing, "z"), None);
  }

  #[test]
  fn removal_target_must_be_non_empty() {
    assert_eq!(
      removal_target(MediaList::VirtualTourVideos, " x ").unwrap(),
      "x"
    );
    assert!(removal_target(MediaList::VirtualTourVideos, "  ").is_err());
  }

  // ─── Store-backed ──────────────────────────────────────────────────────

  use crate::{mock::MockStore, school::test_school};

  fn store_with_videos(videos: &[&str]) -> MockStore {
    let store = MockStore::default();
    let mut school = test_school(7);
    school.virtual_tour_videos = strings(videos);
    store.put_school(school);
    store
  }

  #[tokio::test]
  async fn duplicate_appends_collapse() {
    let store = store_with_videos(&["https://a.mp4"]);
    let urls = MediaInput {
      single: None,
      many:   Some(strings(&["  https://a.mp4  ", "https://a.mp4"])),
    }
    .into_urls(MediaList::VirtualTourVideos)
    .unwrap();

    let school = add_media(&store, 7, MediaList::VirtualTourVideos, &urls)
      .await
      .unwrap();
    assert_eq!(school.virtual_tour_videos, strings(&["https://a.mp4"]));
  }

  #[tokio::test]
  async fn removing_missing_url_leaves_profile_unchanged() {
    let store = store_with_videos(&["https://a.mp4"]);
    let err = remove_media(&store, 7, MediaList::VirtualTourVideos, "https://missing.mp4")
      .await
      .unwrap_err();
    assert!(matches!(err, Error::MediaNotFound { list: MediaList::VirtualTourVideos, .. }));
    assert_eq!(
      store.school(7).unwrap().virtual_tour_videos,
      strings(&["https://a.mp4"])
    );
  }

  #[tokio::test]
  async fn remove_then_add_restores_position_at_end() {
    let store = store_with_videos(&["a", "b", "c"]);
    remove_media(&store, 7, MediaList::VirtualTourVideos, "a").await.unwrap();
    let school = add_media(&store, 7, MediaList::VirtualTourVideos, &strings(&["a"]))
      .await
      .unwrap();
    assert_eq!(school.virtual_tour_videos, strings(&["b", "c", "a"]));
  }

  #[tokio::test]
  async fn gallery_needs_basic_info() {
    let store = MockStore::default();
    let mut school = test_school(7);
    school.city = String::new();
    store.put_school(school);

    let err = add_media(&store, 7, MediaList::GalleryImages, &strings(&["x.jpg"]))
      .await
      .unwrap_err();
    assert!(matches!(&err, Error::Validation(m) if m.contains("city")));

    // Videos have no such requirement.
    add_media(&store, 7, MediaList::VirtualTourVideos, &strings(&["x.mp4"]))
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn facility_images_merge_per_facility() {
    let store = MockStore::default();
    let mut school = test_school(7);
    school.facility_images.insert("Pool".into(), strings(&["p.jpg"]));
    store.put_school(school);

    let school = add_facility_images(&store, 7, "Library", &strings(&["a.jpg", "a.jpg"]))
      .await
      .unwrap();
    assert_eq!(school.facility_images["Library"], strings(&["a.jpg"]));
    assert_eq!(school.facility_images["Pool"], strings(&["p.jpg"]));

    let school = add_facility_images(&store, 7, "Library", &strings(&["a.jpg", "b.jpg"]))
      .await
      .unwrap();
    assert_eq!(school.facility_images["Library"], strings(&["a.jpg", "b.jpg"]));
  }

  #[tokio::test]
  async fn last_facility_image_drops_the_facility() {
    let store = MockStore::default();
    let mut school = test_school(7);
    school.facility_images.insert("Pool".into(), strings(&["p.jpg"]));
    store.put_school(school);

    let err = remove_facility_image(&store, 7, "Pool", "q.jpg").await.unwrap_err();
    assert!(matches!(err, Error::FacilityImageNotFound { .. }));
    let err = remove_facility_image(&store, 7, "Gym", "p.jpg").await.unwrap_err();
    assert!(matches!(err, Error::FacilityImageNotFound { .. }));

    let school = remove_facility_image(&store, 7, "Pool", "p.jpg").await.unwrap();
    assert!(school.facility_images.is_empty());
  }

  #[test]
  fn facility_target_is_required() {
    assert_eq!(facility_target(Some(" Library ")).unwrap(), "Library");
    assert!(facility_target(Some("  ")).is_err());
    assert!(facility_target(None).is_err());
  }

  #[tokio::test]
  async fn unknown_school_is_not_found() {
    let store = MockStore::default();
    assert!(matches!(
      add_media(&store, 1, MediaList::VirtualTourVideos, &strings(&["x"])).await,
      Err(Error::SchoolNotFound(1))
    ));
  }
}
