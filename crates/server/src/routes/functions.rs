//! Job entry points invoked by the external scheduler.

use axum::{
    Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::post,
};
use chrono::NaiveDate;
use serde::Deserialize;
use services::services::{
    auto_fold::{AutoFoldService, AutoFoldSummary},
    check_in_reminder::{CheckInReminderService, ReminderSummary},
    weekly_recap::{RecapSummary, WeeklyRecapService},
};
use ts_rs::TS;
use utils::{
    calendar::{day_before, today_utc},
    response::ApiResponse,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub pact_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AutoFoldRequest {
    /// Defaults to yesterday (UTC)
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRecapRequest {
    /// Recap covers the seven days ending the day before this date. Defaults to today (UTC).
    pub date: Option<NaiveDate>,
    pub pact_id: Option<Uuid>,
}

/// Remind everyone who still owes today's check-in
pub async fn check_in_reminder(
    State(state): State<AppState>,
    body: Option<Json<ReminderRequest>>,
) -> Result<ResponseJson<ApiResponse<ReminderSummary>>, ApiError> {
    let Json(request) = body.unwrap_or_default();
    let summary = CheckInReminderService::run(
        &state.db.pool,
        state.notifier.as_ref(),
        today_utc(),
        request.pact_id,
        state.config.weekly_anchor,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

/// Fold every obligation missed on a past date
pub async fn missed_check_in_auto_fold(
    State(state): State<AppState>,
    body: Option<Json<AutoFoldRequest>>,
) -> Result<ResponseJson<ApiResponse<AutoFoldSummary>>, ApiError> {
    let Json(request) = body.unwrap_or_default();
    let today = today_utc();
    let date = request.date.unwrap_or_else(|| day_before(today));
    if date >= today {
        return Err(ApiError::BadRequest(format!(
            "cannot fold {date}: the day is not over yet"
        )));
    }

    let summary = AutoFoldService::run(&state.db.pool, date, state.config.weekly_anchor).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

/// Generate and store weekly recaps
pub async fn generate_weekly_recap(
    State(state): State<AppState>,
    body: Option<Json<WeeklyRecapRequest>>,
) -> Result<ResponseJson<ApiResponse<RecapSummary>>, ApiError> {
    let Json(request) = body.unwrap_or_default();
    let summary = WeeklyRecapService::run(
        &state.db.pool,
        request.date.unwrap_or_else(today_utc),
        request.pact_id,
        state.config.weekly_anchor,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/functions",
        Router::new()
            .route("/check-in-reminder", post(check_in_reminder))
            .route("/missed-check-in-auto-fold", post(missed_check_in_auto_fold))
            .route("/generate-weekly-recap", post(generate_weekly_recap)),
    )
}
