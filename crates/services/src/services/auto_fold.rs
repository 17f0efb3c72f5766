//! Folds participants who let a due date pass without checking in.

use std::time::Duration;

use chrono::NaiveDate;
use db::{
    DBService, is_unique_violation,
    models::{
        check_in::{CheckIn, CreateCheckIn},
        roast_thread::RoastThread,
    },
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use ts_rs::TS;
use utils::calendar::{day_before, today_utc};
use uuid::Uuid;

use super::{obligation::WeeklyAnchor, snapshot::DaySnapshot};

#[derive(Debug, Error)]
pub enum AutoFoldError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct AutoFoldSummary {
    pub date: NaiveDate,
    pub outstanding: u32,
    pub folded: u32,
    /// Obligations another run folded first
    pub already_folded: u32,
    pub failed: u32,
}

enum FoldOutcome {
    Folded,
    AlreadyFolded,
}

/// Background sweep that folds yesterday's missed check-ins
pub struct AutoFoldService {
    db: DBService,
    poll_interval: Duration,
    anchor: WeeklyAnchor,
}

impl AutoFoldService {
    /// Spawn the background auto-fold sweep
    pub fn spawn(
        db: DBService,
        poll_interval: Duration,
        anchor: WeeklyAnchor,
    ) -> tokio::task::JoinHandle<()> {
        let service = Self {
            db,
            poll_interval,
            anchor,
        };
        tokio::spawn(async move {
            service.start().await;
        })
    }

    async fn start(&self) {
        info!(
            "Starting auto-fold service with interval {:?}, weekly anchor: {}",
            self.poll_interval, self.anchor
        );

        let mut interval = interval(self.poll_interval);

        loop {
            interval.tick().await;
            let yesterday = day_before(today_utc());
            if let Err(e) = Self::run(&self.db.pool, yesterday, self.anchor).await {
                error!("Error folding missed check-ins: {}", e);
            }
        }
    }

    /// Fold every obligation on `date` that has no check-in yet.
    ///
    /// Each fold inserts a `Ghosted` check-in and opens a roast thread in one
    /// transaction. Safe to re-run: existing check-ins are skipped, and losing
    /// an insert race to another run counts as `already_folded`.
    pub async fn run(
        pool: &SqlitePool,
        date: NaiveDate,
        anchor: WeeklyAnchor,
    ) -> Result<AutoFoldSummary, AutoFoldError> {
        let Some(snapshot) = DaySnapshot::load(pool, date, None).await? else {
            return Ok(AutoFoldSummary::empty(date));
        };

        let outstanding = snapshot.outstanding(anchor);
        let mut summary = AutoFoldSummary::empty(date);
        summary.outstanding = outstanding.len() as u32;

        if outstanding.is_empty() {
            debug!(%date, "Auto-fold: no missed check-ins");
            return Ok(summary);
        }

        for item in &outstanding {
            let pact_id = item.pact.id;
            let user_id = item.participant.user_id;
            match fold(pool, pact_id, user_id, date).await {
                Ok(FoldOutcome::Folded) => {
                    debug!(pact_id = %pact_id, user_id = %user_id, %date, "Folded missed check-in");
                    summary.folded += 1;
                }
                Ok(FoldOutcome::AlreadyFolded) => {
                    debug!(pact_id = %pact_id, user_id = %user_id, %date, "Check-in already recorded, skipping fold");
                    summary.already_folded += 1;
                }
                Err(e) => {
                    warn!(
                        pact_id = %pact_id,
                        user_id = %user_id,
                        error = %e,
                        "Failed to fold missed check-in"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            %date,
            outstanding = summary.outstanding,
            folded = summary.folded,
            already_folded = summary.already_folded,
            failed = summary.failed,
            "Auto-fold processed"
        );
        Ok(summary)
    }
}

impl AutoFoldSummary {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            outstanding: 0,
            folded: 0,
            already_folded: 0,
            failed: 0,
        }
    }
}

async fn fold(
    pool: &SqlitePool,
    pact_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<FoldOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let check_in = match CheckIn::create(
        &mut *tx,
        &CreateCheckIn::ghosted(pact_id, user_id, date),
        Uuid::new_v4(),
    )
    .await
    {
        Ok(check_in) => check_in,
        Err(e) if is_unique_violation(&e) => return Ok(FoldOutcome::AlreadyFolded),
        Err(e) => return Err(e),
    };
    RoastThread::create(&mut *tx, check_in.id).await?;

    tx.commit().await?;
    Ok(FoldOutcome::Folded)
}
