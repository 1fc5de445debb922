//! Public directory endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/schools` | Filters, sort and paging as query params |
//! | `GET`  | `/schools/{id}` | Profile plus `feeRange`; counts a view |
//! | `GET`  | `/schools/compare?ids=1,2,3` | 2 to 4 schools |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{PathRejection, QueryRejection},
  },
};
use campus_core::{
  compare::Comparison,
  fees::{FeeRange, compute_fee_range},
  school::{SchoolId, SchoolProfile},
  store::{SchoolQuery, SchoolStore, SortKey, SortOrder},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

fn split_list(raw: Option<String>) -> Vec<String> {
  raw
    .map(|s| {
      s.split(',')
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect()
    })
    .unwrap_or_default()
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  /// Substring over name, city and address.
  pub search:     Option<String>,
  /// Comma-separated cities.
  pub city:       Option<String>,
  pub board:      Option<String>,
  pub featured:   Option<bool>,
  pub fees_min:   Option<f64>,
  pub fees_max:   Option<f64>,
  pub min_rating: Option<f64>,
  /// Comma-separated facility terms; all must match.
  pub facilities: Option<String>,
  pub sort:       Option<SortKey>,
  pub order:      Option<SortOrder>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

impl From<ListParams> for SchoolQuery {
  fn from(params: ListParams) -> Self {
    Self {
      text:       params.search,
      cities:     split_list(params.city),
      board:      params.board.filter(|b| !b.trim().is_empty()),
      featured:   params.featured,
      fees_min:   params.fees_min,
      fees_max:   params.fees_max,
      min_rating: params.min_rating,
      facilities: split_list(params.facilities),
      sort:       params.sort.unwrap_or_default(),
      order:      params.order.unwrap_or_default(),
      limit:      params.limit,
      offset:     params.offset,
    }
  }
}

/// `GET /schools[?search=..][&city=a,b][&board=..][&feesMin=..][&feesMax=..]...`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<SchoolProfile>>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  let Query(params) = params?;
  let query = SchoolQuery::from(params);
  let schools = state
    .store
    .list_schools(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(schools))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolDetail {
  #[serde(flatten)]
  pub school:    SchoolProfile,
  pub fee_range: FeeRange,
}

/// `GET /schools/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  id: Result<Path<SchoolId>, PathRejection>,
) -> Result<Json<SchoolDetail>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  let Path(id) = id?;
  let school = state
    .store
    .get_school(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::not_found("SCHOOL_NOT_FOUND", format!("school {id} not found"))
    })?;

  if let Err(e) = state.store.record_profile_view(id).await {
    tracing::warn!(school_id = id, error = %e, "failed to count profile view");
  }

  let fee_range = compute_fee_range(&school.fees_structure);
  Ok(Json(SchoolDetail { school, fee_range }))
}

// ─── Compare ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CompareParams {
  /// Comma-separated school ids.
  pub ids: String,
}

/// Parse `ids`, dropping repeats but keeping first-seen order.
fn parse_ids(raw: &str) -> Result<Vec<SchoolId>, ApiError> {
  let mut ids: Vec<SchoolId> = Vec::new();
  for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
    let id = part
      .parse()
      .map_err(|_| ApiError::Validation(format!("invalid school id: {part:?}")))?;
    if !ids.contains(&id) {
      ids.push(id);
    }
  }
  Ok(ids)
}

/// `GET /schools/compare?ids=1,2,3`
pub async fn compare<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<CompareParams>, QueryRejection>,
) -> Result<Json<Comparison>, ApiError>
where
  S: SchoolStore + Clone + Send + Sync + 'static,
{
  let Query(params) = params?;
  let ids = parse_ids(&params.ids)?;

  let schools = state
    .store
    .get_schools(&ids)
    .await
    .map_err(ApiError::store)?;
  if let Some(missing) = ids.iter().find(|id| !schools.iter().any(|s| s.id == **id)) {
    return Err(ApiError::not_found(
      "SCHOOL_NOT_FOUND",
      format!("school {missing} not found"),
    ));
  }

  Ok(Json(Comparison::build(&schools)?))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_parse_and_dedupe() {
    assert_eq!(parse_ids("3, 1,3,,2").unwrap(), vec![3, 1, 2]);
    assert!(matches!(parse_ids("1,x"), Err(ApiError::Validation(_))));
  }

  #[test]
  fn list_params_split_comma_lists() {
    let query = SchoolQuery::from(ListParams {
      city: Some("Pune, Mumbai,".into()),
      facilities: Some("library,science lab".into()),
      board: Some("  ".into()),
      ..ListParams::default()
    });
    assert_eq!(query.cities, vec!["Pune", "Mumbai"]);
    assert_eq!(query.facilities, vec!["library", "science lab"]);
    assert_eq!(query.board, None);
    assert_eq!(query.sort, SortKey::Rating);
    assert_eq!(query.order, SortOrder::Desc);
  }
}
