//! Weekly recap generation: per-participant completion and a leaderboard per pact.

use std::collections::HashMap;

use chrono::NaiveDate;
use db::models::{
    check_in::CheckIn,
    pact::{Pact, PactStatus},
    pact_participant::PactParticipant,
    profile::Profile,
    weekly_recap::WeeklyRecap,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;
use utils::calendar::week_before;
use uuid::Uuid;

use super::{obligation::WeeklyAnchor, stats::build_recap};

#[derive(Debug, Error)]
pub enum WeeklyRecapError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("pact not found: {0}")]
    PactNotFound(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct RecapSummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub pacts_recapped: u32,
    /// Pacts with nothing due that week, or nobody to rank
    pub pacts_skipped: u32,
    pub failed: u32,
}

enum RecapOutcome {
    Stored,
    Skipped,
}

pub struct WeeklyRecapService;

impl WeeklyRecapService {
    /// Recap the seven days ending the day before `date` for every active
    /// pact, or only `pact_id`. Re-running for the same week replaces the
    /// stored recap.
    pub async fn run(
        pool: &SqlitePool,
        date: NaiveDate,
        pact_id: Option<Uuid>,
        anchor: WeeklyAnchor,
    ) -> Result<RecapSummary, WeeklyRecapError> {
        let (week_start, week_end) = week_before(date);

        let pacts = match pact_id {
            Some(id) => {
                let pact = Pact::find_by_id(pool, id)
                    .await?
                    .ok_or(WeeklyRecapError::PactNotFound(id))?;
                vec![pact]
            }
            None => Pact::find_active(pool).await?,
        };

        let mut summary = RecapSummary {
            week_start,
            week_end,
            pacts_recapped: 0,
            pacts_skipped: 0,
            failed: 0,
        };

        if pacts.is_empty() {
            debug!(%week_start, %week_end, "Weekly recap: no active pacts");
            return Ok(summary);
        }

        let display_names = Profile::find_display_names(pool).await?;

        for pact in &pacts {
            match recap_pact(pool, pact, &display_names, week_start, week_end, anchor).await {
                Ok(RecapOutcome::Stored) => summary.pacts_recapped += 1,
                Ok(RecapOutcome::Skipped) => summary.pacts_skipped += 1,
                Err(e) => {
                    warn!(pact_id = %pact.id, error = %e, "Failed to generate weekly recap");
                    summary.failed += 1;
                }
            }
        }

        info!(
            %week_start,
            %week_end,
            recapped = summary.pacts_recapped,
            skipped = summary.pacts_skipped,
            failed = summary.failed,
            "Weekly recaps generated"
        );
        Ok(summary)
    }
}

async fn recap_pact(
    pool: &SqlitePool,
    pact: &Pact,
    display_names: &HashMap<Uuid, String>,
    week_start: NaiveDate,
    week_end: NaiveDate,
    anchor: WeeklyAnchor,
) -> Result<RecapOutcome, sqlx::Error> {
    if pact.status != PactStatus::Active {
        debug!(pact_id = %pact.id, "Skipping recap for archived pact");
        return Ok(RecapOutcome::Skipped);
    }

    let participants = PactParticipant::find_by_pact_id(pool, pact.id).await?;
    if participants.is_empty() {
        debug!(pact_id = %pact.id, "Skipping recap for pact without participants");
        return Ok(RecapOutcome::Skipped);
    }

    let check_ins = CheckIn::find_by_pact_in_range(pool, pact.id, week_start, week_end).await?;
    let recap = build_recap(
        pact,
        &participants,
        &check_ins,
        display_names,
        week_start,
        week_end,
        anchor,
    );
    if recap.expected_obligations == 0 {
        debug!(pact_id = %pact.id, "Skipping recap, nothing was due");
        return Ok(RecapOutcome::Skipped);
    }

    WeeklyRecap::upsert(pool, pact.id, &recap).await?;
    Ok(RecapOutcome::Stored)
}
