//! Same-day reminders for participants who still owe a check-in.

use chrono::NaiveDate;
use db::models::{pact::Pact, profile::Profile};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    obligation::WeeklyAnchor,
    push::{PushMessage, PushNotifier},
    snapshot::DaySnapshot,
};

pub const REMINDER_KIND: &str = "check_in_reminder";

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("pact not found: {0}")]
    PactNotFound(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSummary {
    pub date: NaiveDate,
    pub outstanding: u32,
    pub sent: u32,
    pub skipped_no_token: u32,
    pub failed: u32,
}

pub struct CheckInReminderService;

impl CheckInReminderService {
    /// Push a reminder to every participant still owing a check-in on `date`.
    /// Delivery failures are counted and do not stop the run.
    pub async fn run(
        pool: &SqlitePool,
        notifier: &dyn PushNotifier,
        date: NaiveDate,
        pact_id: Option<Uuid>,
        anchor: WeeklyAnchor,
    ) -> Result<ReminderSummary, ReminderError> {
        let snapshot = match DaySnapshot::load(pool, date, pact_id).await? {
            Some(snapshot) => snapshot,
            None => return Err(ReminderError::PactNotFound(pact_id.unwrap_or_default())),
        };

        let outstanding = snapshot.outstanding(anchor);
        let mut summary = ReminderSummary {
            date,
            outstanding: outstanding.len() as u32,
            sent: 0,
            skipped_no_token: 0,
            failed: 0,
        };

        if outstanding.is_empty() {
            debug!(%date, "Check-in reminder: nobody outstanding");
            return Ok(summary);
        }

        let tokens = Profile::find_push_tokens(pool).await?;

        for item in &outstanding {
            let user_id = item.participant.user_id;
            let Some(token) = tokens.get(&user_id) else {
                debug!(pact_id = %item.pact.id, user_id = %user_id, "No push token, skipping reminder");
                summary.skipped_no_token += 1;
                continue;
            };

            match notifier.send(&reminder_message(item.pact, user_id, token)).await {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    warn!(
                        pact_id = %item.pact.id,
                        user_id = %user_id,
                        error = %e,
                        "Failed to send check-in reminder"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            %date,
            outstanding = summary.outstanding,
            sent = summary.sent,
            skipped = summary.skipped_no_token,
            failed = summary.failed,
            "Check-in reminders processed"
        );
        Ok(summary)
    }
}

fn reminder_message(pact: &Pact, user_id: Uuid, token: &str) -> PushMessage {
    let body = match pact.roast_level {
        i32::MIN..=1 => format!("Friendly nudge: \"{}\" still needs your check-in today.", pact.name),
        2 => format!("\"{}\" is waiting on you. Check in before the group notices.", pact.name),
        _ => format!("Check in to \"{}\" now or get cooked.", pact.name),
    };

    PushMessage {
        to: token.to_string(),
        title: "Don't get cooked".to_string(),
        body,
        data: json!({
            "type": REMINDER_KIND,
            "pactId": pact.id,
            "userId": user_id,
        }),
    }
}
