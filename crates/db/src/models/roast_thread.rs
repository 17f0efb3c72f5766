use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "roast_thread_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoastThreadStatus {
    #[default]
    Open,
    Closed,
}

/// Discussion thread opened against a fold
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct RoastThread {
    pub id: Uuid,
    pub check_in_id: Uuid,
    pub status: RoastThreadStatus,
    pub created_at: DateTime<Utc>,
}

impl RoastThread {
    pub async fn create<'e, E>(executor: E, check_in_id: Uuid) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, RoastThread>(
            r#"INSERT INTO roast_threads (id, check_in_id)
               VALUES ($1, $2)
               RETURNING id, check_in_id, status, created_at"#,
        )
        .bind(id)
        .bind(check_in_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_check_in_id(
        pool: &SqlitePool,
        check_in_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RoastThread>(
            r#"SELECT id, check_in_id, status, created_at
               FROM roast_threads
               WHERE check_in_id = $1"#,
        )
        .bind(check_in_id)
        .fetch_optional(pool)
        .await
    }
}
