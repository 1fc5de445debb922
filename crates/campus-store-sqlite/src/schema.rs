//! SQL schema for the campus SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Account records. `school_id` is maintained by account management and is
-- only read here.
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL UNIQUE,
    role        TEXT NOT NULL,     -- 'school' | 'parent' | 'admin'
    school_id   INTEGER,
    created_at  TEXT NOT NULL
);

-- Semi-structured columns hold JSON text. Older rows may carry a JSON
-- document encoded a second time as a JSON string; readers must tolerate it.
CREATE TABLE IF NOT EXISTS schools (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_user_id       INTEGER,
    name                TEXT NOT NULL DEFAULT '',
    board               TEXT NOT NULL DEFAULT '',
    city                TEXT NOT NULL DEFAULT '',
    address             TEXT,
    state               TEXT,
    pincode             TEXT,
    description         TEXT,
    contact_email       TEXT,
    contact_phone       TEXT,
    website             TEXT,
    establishment_year  INTEGER,
    school_type         TEXT,
    fees_structure      TEXT NOT NULL DEFAULT '{}',
    fees_min            REAL,
    fees_max            REAL,
    facility_flags      TEXT NOT NULL DEFAULT '{}',
    facilities          TEXT NOT NULL DEFAULT '[]',
    facility_images     TEXT NOT NULL DEFAULT '{}',
    virtual_tour_videos TEXT NOT NULL DEFAULT '[]',
    gallery_images      TEXT NOT NULL DEFAULT '[]',
    awards              TEXT NOT NULL DEFAULT '[]',
    rating              REAL NOT NULL DEFAULT 0,
    review_count        INTEGER NOT NULL DEFAULT 0,
    profile_views       INTEGER NOT NULL DEFAULT 0,
    featured            INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS schools_owner_idx ON schools(owner_user_id);
CREATE INDEX IF NOT EXISTS schools_city_idx  ON schools(city);

-- Admission enquiries. `notes` is a JSON array of {date, text}; older rows
-- may hold a single plain-text note instead.
CREATE TABLE IF NOT EXISTS enquiries (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    school_id       INTEGER NOT NULL,
    parent_user_id  INTEGER,
    student_name    TEXT NOT NULL,
    student_email   TEXT NOT NULL,
    student_phone   TEXT NOT NULL,
    student_class   TEXT NOT NULL,
    message         TEXT,
    status          TEXT NOT NULL DEFAULT 'New',
    notes           TEXT NOT NULL DEFAULT '[]',
    follow_up_date  TEXT,             -- YYYY-MM-DD
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS enquiries_school_idx ON enquiries(school_id, created_at);
CREATE INDEX IF NOT EXISTS enquiries_parent_idx ON enquiries(parent_user_id);

PRAGMA user_version = 2;
";

/// Columns of `schools`, in the order [`crate::encode::RawSchool::from_row`]
/// reads them.
pub const SCHOOL_COLUMNS: &str = "id, owner_user_id, name, board, city, \
  address, state, pincode, description, contact_email, contact_phone, \
  website, establishment_year, school_type, fees_structure, fees_min, \
  fees_max, facility_flags, facilities, facility_images, \
  virtual_tour_videos, gallery_images, awards, rating, review_count, \
  profile_views, featured, created_at, updated_at";

/// Columns of `enquiries`, in the order
/// [`crate::encode::RawEnquiry::from_row`] reads them.
pub const ENQUIRY_COLUMNS: &str = "id, school_id, parent_user_id, \
  student_name, student_email, student_phone, student_class, message, \
  status, notes, follow_up_date, created_at, updated_at";
