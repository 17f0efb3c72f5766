//! Read-only pact analytics.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::NaiveDate;
use db::models::{
    check_in::CheckIn,
    pact::Pact,
    pact_participant::PactParticipant,
    profile::Profile,
    weekly_recap::{RecapData, WeeklyRecap},
};
use serde::{Deserialize, Serialize};
use services::services::{snapshot::DaySnapshot, stats::build_recap};
use ts_rs::TS;
use utils::{
    calendar::{today_utc, week_before},
    response::ApiResponse,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Longest range the stats route scores in one request
const MAX_STATS_RANGE_DAYS: i64 = 366;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct OutstandingQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingObligation {
    pub pact_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
}

async fn load_pact(state: &AppState, pact_id: Uuid) -> Result<Pact, ApiError> {
    Pact::find_by_id(&state.db.pool, pact_id)
        .await?
        .ok_or(ApiError::PactNotFound(pact_id))
}

/// Completion stats and leaderboard for a pact over a date range.
/// Defaults to the last full week.
pub async fn get_pact_stats(
    State(state): State<AppState>,
    Path(pact_id): Path<Uuid>,
    Query(query): Query<StatsQuery>,
) -> Result<ResponseJson<ApiResponse<RecapData>>, ApiError> {
    let (default_start, default_end) = week_before(today_utc());
    let start = query.start.unwrap_or(default_start);
    let end = query.end.unwrap_or(default_end);
    if (end - start).num_days() >= MAX_STATS_RANGE_DAYS {
        return Err(ApiError::BadRequest(format!(
            "range {start}..{end} exceeds {MAX_STATS_RANGE_DAYS} days"
        )));
    }
    let pact = load_pact(&state, pact_id).await?;

    let participants = PactParticipant::find_by_pact_id(&state.db.pool, pact_id).await?;
    let check_ins = CheckIn::find_by_pact_in_range(&state.db.pool, pact_id, start, end).await?;
    let display_names = Profile::find_display_names(&state.db.pool).await?;

    let recap = build_recap(
        &pact,
        &participants,
        &check_ins,
        &display_names,
        start,
        end,
        state.config.weekly_anchor,
    );
    Ok(ResponseJson(ApiResponse::success(recap)))
}

/// Most recently stored weekly recap, if any
pub async fn get_latest_recap(
    State(state): State<AppState>,
    Path(pact_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Option<RecapData>>>, ApiError> {
    load_pact(&state, pact_id).await?;
    let recap = WeeklyRecap::find_latest_by_pact_id(&state.db.pool, pact_id)
        .await?
        .and_then(|recap| recap.parsed_recap());
    Ok(ResponseJson(ApiResponse::success(recap)))
}

/// Participants of a pact who still owe a check-in on a date (default today)
pub async fn get_outstanding(
    State(state): State<AppState>,
    Path(pact_id): Path<Uuid>,
    Query(query): Query<OutstandingQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<OutstandingObligation>>>, ApiError> {
    let date = query.date.unwrap_or_else(today_utc);
    let snapshot = DaySnapshot::load(&state.db.pool, date, Some(pact_id))
        .await?
        .ok_or(ApiError::PactNotFound(pact_id))?;

    let outstanding = snapshot
        .outstanding(state.config.weekly_anchor)
        .into_iter()
        .map(|item| OutstandingObligation {
            pact_id: item.pact.id,
            user_id: item.participant.user_id,
            date,
        })
        .collect();
    Ok(ResponseJson(ApiResponse::success(outstanding)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/pacts/{pact_id}",
        Router::new()
            .route("/stats", get(get_pact_stats))
            .route("/recap", get(get_latest_recap))
            .route("/outstanding", get(get_outstanding)),
    )
}
