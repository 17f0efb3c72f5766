use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::weekday_set::WeekdaySet;

/// Membership of a user in a pact
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct PactParticipant {
    pub id: Uuid,
    pub pact_id: Uuid,
    pub user_id: Uuid,
    pub relay_days: Option<WeekdaySet>, // Only meaningful for relay pacts
    pub joined_at: DateTime<Utc>,
}

impl PactParticipant {
    pub async fn create(
        pool: &SqlitePool,
        pact_id: Uuid,
        user_id: Uuid,
        relay_days: Option<WeekdaySet>,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, PactParticipant>(
            r#"INSERT INTO pact_participants (id, pact_id, user_id, relay_days)
               VALUES ($1, $2, $3, $4)
               RETURNING id, pact_id, user_id, relay_days, joined_at"#,
        )
        .bind(id)
        .bind(pact_id)
        .bind(user_id)
        .bind(relay_days)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_pact_id(
        pool: &SqlitePool,
        pact_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PactParticipant>(
            r#"SELECT id, pact_id, user_id, relay_days, joined_at
               FROM pact_participants
               WHERE pact_id = $1
               ORDER BY joined_at ASC, id ASC"#,
        )
        .bind(pact_id)
        .fetch_all(pool)
        .await
    }

    /// Participants of every non-archived pact, keyed by pact id
    pub async fn find_for_active_pacts(
        pool: &SqlitePool,
    ) -> Result<HashMap<Uuid, Vec<Self>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PactParticipant>(
            r#"SELECT pp.id, pp.pact_id, pp.user_id, pp.relay_days, pp.joined_at
               FROM pact_participants pp
               JOIN pacts p ON p.id = pp.pact_id
               WHERE p.status = 'active'
               ORDER BY pp.joined_at ASC, pp.id ASC"#,
        )
        .fetch_all(pool)
        .await?;

        let mut by_pact: HashMap<Uuid, Vec<Self>> = HashMap::new();
        for participant in rows {
            by_pact
                .entry(participant.pact_id)
                .or_default()
                .push(participant);
        }
        Ok(by_pact)
    }
}
