//! Admission enquiries.
//!
//! | Method | Path | Caller |
//! |--------|------|--------|
//! | `POST` | `/enquiries` | Anyone; a `parent` token links the enquiry → 201 |
//! | `GET`  | `/enquiries` | `parent`: enquiries they sent |
//! | `GET`  | `/schools/enquiries` | `school`: leads for their school, with paging metadata |
//! | `PUT`  | `/enquiries/{id}` | `school`: status, note, follow-up date |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
};
use campus_core::{
  enquiry::{
    Enquiry, EnquiryFilter, EnquiryId, EnquiryRequest, LeadPage, LeadUpdate, SentEnquiry,
    list_leads, list_sent_enquiries, submit_enquiry, update_lead,
  },
  identity::Role,
  owner::require_school_role,
  store::SchoolStore,
};

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `POST /enquiries`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  caller: Option<Authenticated>,
  body: Result<Json<EnquiryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Enquiry>), ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  let Json(request) = body?;
  let caller = caller.map(|Authenticated(identity)| identity);
  let enquiry = submit_enquiry(&*state.store, caller.as_ref(), request).await?;
  Ok((StatusCode::CREATED, Json(enquiry)))
}

/// `GET /enquiries[?status=..][&studentClass=..][&limit=..][&offset=..]`
pub async fn list_sent<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  params: Result<Query<EnquiryFilter>, QueryRejection>,
) -> Result<Json<Vec<SentEnquiry>>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  if identity.role != Role::Parent {
    return Err(ApiError::ForbiddenRole(identity.role));
  }
  let Query(filter) = params?;
  let sent = list_sent_enquiries(&*state.store, &identity, filter).await?;
  Ok(Json(sent))
}

/// `GET /schools/enquiries[?status=..][&studentClass=..][&limit=..][&offset=..]`
pub async fn list_for_school<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  params: Result<Query<EnquiryFilter>, QueryRejection>,
) -> Result<Json<LeadPage>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  require_school_role(&identity)?;
  let Query(filter) = params?;
  let page = list_leads(&*state.store, &identity, filter).await?;
  Ok(Json(page))
}

/// `PUT /enquiries/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  id: Result<Path<EnquiryId>, PathRejection>,
  body: Result<Json<LeadUpdate>, JsonRejection>,
) -> Result<Json<Enquiry>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  require_school_role(&identity)?;
  let Path(id) = id?;
  let Json(update) = body?;
  let enquiry = update_lead(&*state.store, &identity, id, update).await?;
  Ok(Json(enquiry))
}
