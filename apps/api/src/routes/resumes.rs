use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::intake::{normalize_reviewed, normalize_update};
use crate::models::resume::{ResumeRecord, ResumeUpdate};
use crate::report::{flatten, group_rows, parse_group_keys, summarize, GroupedRow, SummaryStats};
use crate::state::AppState;
use crate::store::{self, SaveReport, SearchFilter};

#[derive(Deserialize)]
pub struct SaveRequest {
    pub records: Vec<ResumeRecord>,
}

/// Raw search query. Every field arrives as text so that an empty
/// `created_since=` from a blank form input means "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub company: Option<String>,
    pub graduation: Option<String>,
    pub created_since: Option<String>,
}

impl SearchParams {
    pub fn into_filter(self) -> Result<SearchFilter, AppError> {
        let created_since = match self.created_since.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                AppError::Validation(format!("created_since must be YYYY-MM-DD, got {raw:?}"))
            })?),
        };
        Ok(SearchFilter {
            name: self.name,
            company: self.company,
            graduation: self.graduation,
            created_since,
        })
    }
}

#[derive(Deserialize)]
pub struct GroupQuery {
    /// Comma-separated keys, e.g. `name,company`.
    pub by: Option<String>,
}

/// POST /api/v1/resumes
pub async fn handle_save(
    State(state): State<AppState>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SaveReport>, AppError> {
    if req.records.is_empty() {
        return Err(AppError::Validation("No records to save".to_string()));
    }
    let today = Utc::now().date_naive();
    let records = req
        .records
        .into_iter()
        .map(|r| normalize_reviewed(r, today))
        .collect::<Result<Vec<_>, _>>()?;

    let report = store::save_batch(&state.db, &records, today).await?;
    Ok(Json(report))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeRecord>>, AppError> {
    Ok(Json(store::fetch_resumes(&state.db).await?))
}

/// GET /api/v1/resumes/search
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ResumeRecord>>, AppError> {
    let filter = params.into_filter()?;
    Ok(Json(store::search_resumes(&state.db, &filter).await?))
}

/// GET /api/v1/resumes/summary
pub async fn handle_summary(
    State(state): State<AppState>,
) -> Result<Json<SummaryStats>, AppError> {
    let records = store::fetch_resumes(&state.db).await?;
    Ok(Json(summarize(&flatten(&records))))
}

/// GET /api/v1/resumes/grouped
pub async fn handle_grouped(
    State(state): State<AppState>,
    Query(params): Query<GroupQuery>,
) -> Result<Json<Vec<GroupedRow>>, AppError> {
    let keys = parse_group_keys(params.by.as_deref()).map_err(AppError::Validation)?;
    let records = store::fetch_resumes(&state.db).await?;
    Ok(Json(group_rows(&flatten(&records), &keys)))
}

/// GET /api/v1/resumes/:mobile
pub async fn handle_get(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> Result<Json<ResumeRecord>, AppError> {
    store::get_resume(&state.db, &mobile)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No resume with mobile {mobile}")))
}

/// PUT /api/v1/resumes/:mobile
pub async fn handle_update(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
    Json(update): Json<ResumeUpdate>,
) -> Result<Json<ResumeRecord>, AppError> {
    let update = normalize_update(update, Utc::now().date_naive());
    if !store::update_resume(&state.db, &mobile, &update).await? {
        return Err(AppError::NotFound(format!("No resume with mobile {mobile}")));
    }
    store::get_resume(&state.db, &mobile)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No resume with mobile {mobile}")))
}

/// DELETE /api/v1/resumes/:mobile
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> Result<StatusCode, AppError> {
    if store::delete_resume(&state.db, &mobile).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("No resume with mobile {mobile}")))
    }
}
