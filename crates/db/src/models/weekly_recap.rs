use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// One participant's line in a weekly recap, ordered by leaderboard rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecap {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub rank: u32,
    pub expected_obligations: u32,
    pub successes: u32,
    pub folds: u32,
    pub completion_rate: f64, // 0.0 ..= 1.0
    pub current_streak: u32,
}

/// Aggregated week of obligations for a pact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RecapData {
    pub pact_name: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub expected_obligations: u32,
    pub participants: Vec<ParticipantRecap>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct WeeklyRecap {
    pub id: Uuid,
    pub pact_id: Uuid,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub recap_data: String, // JSON-serialized RecapData
    pub created_at: DateTime<Utc>,
}

impl WeeklyRecap {
    /// Parse the recap_data JSON into a RecapData struct
    pub fn parsed_recap(&self) -> Option<RecapData> {
        serde_json::from_str(&self.recap_data).ok()
    }

    /// Store the recap for a pact's week, replacing any earlier run for the same week
    pub async fn upsert(
        pool: &SqlitePool,
        pact_id: Uuid,
        recap: &RecapData,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let json =
            serde_json::to_string(recap).map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        sqlx::query_as::<_, WeeklyRecap>(
            r#"INSERT INTO weekly_recaps (id, pact_id, week_start, week_end, recap_data)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT(pact_id, week_start) DO UPDATE SET
                   week_end = excluded.week_end,
                   recap_data = excluded.recap_data,
                   created_at = datetime('now', 'subsec')
               RETURNING id, pact_id, week_start, week_end, recap_data, created_at"#,
        )
        .bind(id)
        .bind(pact_id)
        .bind(recap.week_start)
        .bind(recap.week_end)
        .bind(json)
        .fetch_one(pool)
        .await
    }

    pub async fn find_latest_by_pact_id(
        pool: &SqlitePool,
        pact_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WeeklyRecap>(
            r#"SELECT id, pact_id, week_start, week_end, recap_data, created_at
               FROM weekly_recaps
               WHERE pact_id = $1
               ORDER BY week_start DESC
               LIMIT 1"#,
        )
        .bind(pact_id)
        .fetch_optional(pool)
        .await
    }
}
