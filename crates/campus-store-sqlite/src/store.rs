//! [`SqliteStore`]: the SQLite implementation of [`SchoolStore`].

use std::{collections::BTreeMap, path::Path};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};

use campus_core::{
  enquiry::{
    Enquiry, EnquiryChanges, EnquiryId, EnquiryQuery, EnquiryScope, EnquiryStatus,
    NewEnquiry,
  },
  facility::matches_facility_term,
  fees::compute_fee_range,
  media::MediaList,
  profile::ProfileChanges,
  school::{NewSchool, NewUser, SchoolId, SchoolProfile, UserId, UserRecord},
  store::{SchoolQuery, SchoolStore, SortKey, SortOrder},
};

use crate::{
  Error, Result,
  encode::{
    RawEnquiry, RawSchool, RawUser, decode_status, encode_date, encode_dt, encode_json,
  },
  schema::{ENQUIRY_COLUMNS, SCHEMA, SCHOOL_COLUMNS},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A campus directory store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by the tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single `UPDATE <table> ... WHERE id = ?` and report whether a row
  /// was touched. `updated_at` is always bumped.
  async fn update_row(
    &self,
    table: &'static str,
    id: i64,
    mut sets: Vec<(&'static str, SqlValue)>,
  ) -> Result<bool> {
    sets.push(("updated_at", SqlValue::Text(encode_dt(Utc::now()))));

    let changed = self
      .conn
      .call(move |conn| {
        let assignments: Vec<String> = sets
          .iter()
          .enumerate()
          .map(|(i, (column, _))| format!("{column} = ?{}", i + 2))
          .collect();
        let sql = format!(
          "UPDATE {table} SET {} WHERE id = ?1",
          assignments.join(", ")
        );

        let params = std::iter::once(SqlValue::Integer(id))
          .chain(sets.into_iter().map(|(_, value)| value));
        Ok(conn.execute(&sql, rusqlite::params_from_iter(params))?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn update_school(
    &self,
    school_id: SchoolId,
    sets: Vec<(&'static str, SqlValue)>,
  ) -> Result<bool> {
    self.update_row("schools", school_id, sets).await
  }

  async fn select_schools(
    &self,
    where_clause: String,
    params: Vec<SqlValue>,
  ) -> Result<Vec<SchoolProfile>> {
    let raws: Vec<RawSchool> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {SCHOOL_COLUMNS} FROM schools {where_clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawSchool::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSchool::into_school).collect()
  }

  async fn select_enquiries(
    &self,
    clause: String,
    params: Vec<SqlValue>,
  ) -> Result<Vec<Enquiry>> {
    let raws: Vec<RawEnquiry> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {ENQUIRY_COLUMNS} FROM enquiries {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawEnquiry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEnquiry::into_enquiry).collect()
  }
}

fn text(value: Option<String>) -> SqlValue {
  value.map_or(SqlValue::Null, SqlValue::Text)
}

fn real(value: Option<f64>) -> SqlValue {
  value.map_or(SqlValue::Null, SqlValue::Real)
}

fn media_column(list: MediaList) -> &'static str {
  match list {
    MediaList::VirtualTourVideos => "virtual_tour_videos",
    MediaList::GalleryImages => "gallery_images",
  }
}

fn sort_column(key: SortKey) -> &'static str {
  match key {
    SortKey::Rating => "rating",
    SortKey::Name => "name COLLATE NOCASE",
    SortKey::FeesMin => "fees_min",
    SortKey::FeesMax => "fees_max",
    SortKey::ProfileViews => "profile_views",
    SortKey::EstablishmentYear => "establishment_year",
  }
}

/// Push a parameter and return its placeholder.
fn bind(params: &mut Vec<SqlValue>, value: SqlValue) -> String {
  params.push(value);
  format!("?{}", params.len())
}

/// Make `%`, `_` and `\` match literally under `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

/// `WHERE ... ORDER BY ...` for every filter SQL can evaluate. Facility
/// terms are matched in memory afterwards.
fn directory_clause(query: &SchoolQuery) -> (String, Vec<SqlValue>) {
  let mut conds: Vec<String> = Vec::new();
  let mut params: Vec<SqlValue> = Vec::new();

  if let Some(t) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
    let p = bind(&mut params, SqlValue::Text(format!("%{}%", escape_like(t))));
    conds.push(format!(
      "(name LIKE {p} ESCAPE '\\' OR city LIKE {p} ESCAPE '\\' \
       OR IFNULL(address, '') LIKE {p} ESCAPE '\\')"
    ));
  }
  if !query.cities.is_empty() {
    let placeholders: Vec<String> = query
      .cities
      .iter()
      .map(|c| bind(&mut params, SqlValue::Text(c.trim().to_lowercase())))
      .collect();
    conds.push(format!("lower(city) IN ({})", placeholders.join(", ")));
  }
  if let Some(board) = &query.board {
    let p = bind(&mut params, SqlValue::Text(board.trim().to_owned()));
    conds.push(format!("board = {p} COLLATE NOCASE"));
  }
  if let Some(featured) = query.featured {
    let p = bind(&mut params, SqlValue::Integer(featured.into()));
    conds.push(format!("featured = {p}"));
  }
  if let Some(min) = query.fees_min {
    let p = bind(&mut params, SqlValue::Real(min));
    conds.push(format!("IFNULL(fees_min, 0) >= {p}"));
  }
  if let Some(max) = query.fees_max {
    let p = bind(&mut params, SqlValue::Real(max));
    // A school without fee data counts as zero and stays in the results.
    conds.push(format!("IFNULL(fees_max, 0) <= {p}"));
  }
  if let Some(rating) = query.min_rating {
    let p = bind(&mut params, SqlValue::Real(rating));
    conds.push(format!("rating >= {p}"));
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };

  let column = sort_column(query.sort);
  let direction = match query.order {
    SortOrder::Asc => "ASC",
    SortOrder::Desc => "DESC",
  };
  // NULLs always last, then a stable tiebreak.
  let order = format!("ORDER BY {column} IS NULL, {column} {direction}, id ASC");

  (format!("{where_clause} {order}"), params)
}

/// `WHERE ...` for an enquiry listing, without ordering or paging.
fn enquiry_clause(query: &EnquiryQuery) -> (String, Vec<SqlValue>) {
  let mut params: Vec<SqlValue> = Vec::new();
  let mut conds = vec![match query.scope {
    EnquiryScope::School(id) => {
      format!("school_id = {}", bind(&mut params, SqlValue::Integer(id)))
    }
    EnquiryScope::Parent(id) => {
      format!("parent_user_id = {}", bind(&mut params, SqlValue::Integer(id)))
    }
  }];

  if let Some(status) = query.status {
    let p = bind(&mut params, SqlValue::Text(status.as_str().to_owned()));
    conds.push(format!("status = {p}"));
  }
  if let Some(class) = &query.student_class {
    let p = bind(&mut params, SqlValue::Text(class.clone()));
    conds.push(format!("student_class = {p} COLLATE NOCASE"));
  }

  (format!("WHERE {}", conds.join(" AND ")), params)
}

// ─── SchoolStore impl ────────────────────────────────────────────────────────

impl SchoolStore for SqliteStore {
  type Error = Error;

  // ── Out-of-band creation ──────────────────────────────────────────────────

  async fn insert_school(&self, input: NewSchool) -> Result<SchoolProfile> {
    let range = compute_fee_range(&input.fees_structure);
    let fees = match &input.fees_structure {
      serde_json::Value::Null => "{}".to_owned(),
      other => encode_json(other)?,
    };
    let flags = encode_json(&input.facility_flags)?;
    let facilities = encode_json(&input.facilities)?;
    let videos = encode_json(&input.virtual_tour_videos)?;
    let images = encode_json(&input.gallery_images)?;
    let now = encode_dt(Utc::now());

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO schools (
             owner_user_id, name, board, city, address, state, description,
             contact_email, contact_phone, website, establishment_year,
             school_type, fees_structure, fees_min, fees_max, facility_flags,
             facilities, virtual_tour_videos, gallery_images, rating,
             featured, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?22)",
          rusqlite::params![
            input.owner_user_id,
            input.name,
            input.board,
            input.city,
            input.address,
            input.state,
            input.description,
            input.contact_email.map(|e| e.to_lowercase()),
            input.contact_phone,
            input.website,
            input.establishment_year,
            input.school_type,
            fees,
            range.min,
            range.max,
            flags,
            facilities,
            videos,
            images,
            input.rating,
            input.featured,
            now,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    self.get_school(id).await?.ok_or(Error::MissingRow(id))
  }

  async fn insert_user(&self, input: NewUser) -> Result<UserRecord> {
    let created_at = Utc::now();
    let email = input.email.trim().to_lowercase();
    let role = input.role.as_str();
    let at_str = encode_dt(created_at);
    let email_param = email.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (email, role, school_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![email_param, role, input.school_id, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(UserRecord {
      id,
      email,
      role: input.role,
      school_id: input.school_id,
      created_at,
    })
  }

  // ── Point lookups ─────────────────────────────────────────────────────────

  async fn get_school(&self, id: SchoolId) -> Result<Option<SchoolProfile>> {
    let raw: Option<RawSchool> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = ?1"),
              rusqlite::params![id],
              RawSchool::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSchool::into_school).transpose()
  }

  async fn find_school_id_by_owner(&self, user_id: UserId) -> Result<Option<SchoolId>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT id FROM schools WHERE owner_user_id = ?1
                 ORDER BY id LIMIT 1",
                rusqlite::params![user_id],
                |row| row.get::<_, SchoolId>(0),
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, email, role, school_id, created_at
               FROM users WHERE id = ?1",
              rusqlite::params![id],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn link_owner(&self, school_id: SchoolId, user_id: UserId) -> Result<bool> {
    let now = encode_dt(Utc::now());
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE schools SET owner_user_id = ?2, updated_at = ?3
           WHERE id = ?1 AND owner_user_id IS NULL",
          rusqlite::params![school_id, user_id, now],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn replace_media(
    &self,
    school_id: SchoolId,
    list: MediaList,
    urls: Vec<String>,
  ) -> Result<bool> {
    let encoded = encode_json(&urls)?;
    self
      .update_school(school_id, vec![(media_column(list), SqlValue::Text(encoded))])
      .await
  }

  async fn update_profile(
    &self,
    school_id: SchoolId,
    changes: ProfileChanges,
  ) -> Result<bool> {
    let mut sets: Vec<(&'static str, SqlValue)> = changes
      .text
      .into_iter()
      .map(|(field, value)| (field.column(), text(value)))
      .collect();

    if let Some(year) = changes.establishment_year {
      sets.push(("establishment_year", SqlValue::Integer(year.into())));
    }
    if let Some(flags) = &changes.facility_flags {
      sets.push(("facility_flags", SqlValue::Text(encode_json(flags)?)));
    }
    if let Some(facilities) = &changes.facilities {
      sets.push(("facilities", SqlValue::Text(encode_json(facilities)?)));
    }
    if let Some((fees, range)) = &changes.fees {
      sets.push(("fees_structure", SqlValue::Text(encode_json(fees)?)));
      sets.push(("fees_min", real(range.min)));
      sets.push(("fees_max", real(range.max)));
    }
    if let Some(images) = &changes.facility_images {
      sets.push(("facility_images", SqlValue::Text(encode_json(images)?)));
    }
    if let Some(awards) = &changes.awards {
      sets.push(("awards", SqlValue::Text(encode_json(awards)?)));
    }

    self.update_school(school_id, sets).await
  }

  async fn record_profile_view(&self, school_id: SchoolId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE schools SET profile_views = profile_views + 1 WHERE id = ?1",
          rusqlite::params![school_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Directory reads ───────────────────────────────────────────────────────

  async fn list_schools(&self, query: &SchoolQuery) -> Result<Vec<SchoolProfile>> {
    let (clause, mut params) = directory_clause(query);
    let limit = query.effective_limit();
    let offset = query.effective_offset();

    let terms: Vec<&str> = query
      .facilities
      .iter()
      .map(|t| t.trim())
      .filter(|t| !t.is_empty())
      .collect();

    if terms.is_empty() {
      params.push(SqlValue::Integer(limit as i64));
      params.push(SqlValue::Integer(offset as i64));
      let n = params.len();
      let clause = format!("{clause} LIMIT ?{} OFFSET ?{n}", n - 1);
      return self.select_schools(clause, params).await;
    }

    // Facility terms need the decoded profile, so paginate after matching.
    let schools = self.select_schools(clause, params).await?;
    Ok(
      schools
        .into_iter()
        .filter(|school| terms.iter().all(|t| matches_facility_term(school, t)))
        .skip(offset)
        .take(limit)
        .collect(),
    )
  }

  async fn get_schools(&self, ids: &[SchoolId]) -> Result<Vec<SchoolProfile>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    let placeholders: Vec<String> =
      (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let clause = format!("WHERE id IN ({})", placeholders.join(", "));
    let params = ids.iter().map(|id| SqlValue::Integer(*id)).collect();
    let found = self.select_schools(clause, params).await?;

    Ok(
      ids
        .iter()
        .filter_map(|id| found.iter().find(|s| s.id == *id).cloned())
        .collect(),
    )
  }

  // ── Enquiries ─────────────────────────────────────────────────────────────

  async fn insert_enquiry(&self, input: NewEnquiry) -> Result<Enquiry> {
    let now = encode_dt(Utc::now());
    let status = EnquiryStatus::New.as_str();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO enquiries (
             school_id, parent_user_id, student_name, student_email,
             student_phone, student_class, message, status, notes,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '[]', ?9, ?9)",
          rusqlite::params![
            input.school_id,
            input.parent_user_id,
            input.student_name,
            input.student_email,
            input.student_phone,
            input.student_class,
            input.message,
            status,
            now,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    self.get_enquiry(id).await?.ok_or(Error::MissingRow(id))
  }

  async fn get_enquiry(&self, id: EnquiryId) -> Result<Option<Enquiry>> {
    let found = self
      .select_enquiries("WHERE id = ?1".to_owned(), vec![SqlValue::Integer(id)])
      .await?;
    Ok(found.into_iter().next())
  }

  async fn list_enquiries(&self, query: &EnquiryQuery) -> Result<Vec<Enquiry>> {
    let (clause, mut params) = enquiry_clause(query);
    let limit = bind(&mut params, SqlValue::Integer(query.effective_limit() as i64));
    let offset = bind(&mut params, SqlValue::Integer(query.effective_offset() as i64));
    let clause =
      format!("{clause} ORDER BY created_at DESC, id DESC LIMIT {limit} OFFSET {offset}");
    self.select_enquiries(clause, params).await
  }

  async fn count_enquiries(&self, query: &EnquiryQuery) -> Result<u64> {
    let (clause, params) = enquiry_clause(query);
    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!("SELECT COUNT(*) FROM enquiries {clause}"),
          rusqlite::params_from_iter(params),
          |row| row.get::<_, i64>(0),
        )?)
      })
      .await?;
    Ok(count.max(0) as u64)
  }

  async fn enquiry_status_counts(
    &self,
    school_id: SchoolId,
  ) -> Result<BTreeMap<EnquiryStatus, u64>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT status, COUNT(*) FROM enquiries
           WHERE school_id = ?1 GROUP BY status",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![school_id], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(status, count)| Ok((decode_status(&status)?, count.max(0) as u64)))
      .collect()
  }

  async fn update_enquiry(&self, id: EnquiryId, changes: EnquiryChanges) -> Result<bool> {
    let mut sets: Vec<(&'static str, SqlValue)> = Vec::new();
    if let Some(status) = changes.status {
      sets.push(("status", SqlValue::Text(status.as_str().to_owned())));
    }
    if let Some(notes) = &changes.notes {
      sets.push(("notes", SqlValue::Text(encode_json(notes)?)));
    }
    if let Some(date) = changes.follow_up_date {
      sets.push(("follow_up_date", SqlValue::Text(encode_date(date))));
    }
    self.update_row("enquiries", id, sets).await
  }
}
