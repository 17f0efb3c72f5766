use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Excuse recorded on folds created by the missed check-in sweep
pub const GHOSTED_EXCUSE: &str = "Ghosted";

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "check_in_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckInStatus {
    Success,
    Fold,
}

/// Immutable record of a participant's check-in (or fold) for one date
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CheckIn {
    pub id: Uuid,
    pub pact_id: Uuid,
    pub user_id: Uuid,
    pub status: CheckInStatus,
    pub excuse: Option<String>,
    pub proof_url: Option<String>,
    pub check_in_date: NaiveDate,
    pub is_late: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCheckIn {
    pub pact_id: Uuid,
    pub user_id: Uuid,
    pub status: CheckInStatus,
    pub excuse: Option<String>,
    pub proof_url: Option<String>,
    pub check_in_date: NaiveDate,
    pub is_late: bool,
}

impl CreateCheckIn {
    pub fn success(pact_id: Uuid, user_id: Uuid, check_in_date: NaiveDate) -> Self {
        Self {
            pact_id,
            user_id,
            status: CheckInStatus::Success,
            excuse: None,
            proof_url: None,
            check_in_date,
            is_late: false,
        }
    }

    /// Fold recorded on behalf of a participant who never showed up
    pub fn ghosted(pact_id: Uuid, user_id: Uuid, check_in_date: NaiveDate) -> Self {
        Self {
            pact_id,
            user_id,
            status: CheckInStatus::Fold,
            excuse: Some(GHOSTED_EXCUSE.to_string()),
            proof_url: None,
            check_in_date,
            is_late: true,
        }
    }
}

impl CheckIn {
    /// Insert a check-in. Fails with a unique violation if the participant
    /// already has a record for that pact and date.
    pub async fn create<'e, E>(
        executor: E,
        data: &CreateCheckIn,
        id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, CheckIn>(
            r#"INSERT INTO check_ins (id, pact_id, user_id, status, excuse, proof_url, check_in_date, is_late)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING id, pact_id, user_id, status, excuse, proof_url, check_in_date, is_late, created_at"#,
        )
        .bind(id)
        .bind(data.pact_id)
        .bind(data.user_id)
        .bind(data.status)
        .bind(data.excuse.clone())
        .bind(data.proof_url.clone())
        .bind(data.check_in_date)
        .bind(data.is_late)
        .fetch_one(executor)
        .await
    }

    /// Every check-in recorded for `date`, across all pacts
    pub async fn find_by_date(
        pool: &SqlitePool,
        date: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CheckIn>(
            r#"SELECT id, pact_id, user_id, status, excuse, proof_url, check_in_date, is_late, created_at
               FROM check_ins
               WHERE check_in_date = $1
               ORDER BY created_at ASC"#,
        )
        .bind(date)
        .fetch_all(pool)
        .await
    }

    /// Check-ins for one pact between `start` and `end`, inclusive
    pub async fn find_by_pact_in_range(
        pool: &SqlitePool,
        pact_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CheckIn>(
            r#"SELECT id, pact_id, user_id, status, excuse, proof_url, check_in_date, is_late, created_at
               FROM check_ins
               WHERE pact_id = $1
                 AND check_in_date >= $2
                 AND check_in_date <= $3
               ORDER BY check_in_date ASC, created_at ASC"#,
        )
        .bind(pact_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }
}
