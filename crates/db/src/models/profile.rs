use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Profile {
    pub user_id: Uuid,
    pub display_name: String,
    pub push_token: Option<String>, // Expo push token, absent until the app registers one
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        display_name: &str,
        push_token: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"INSERT INTO profiles (user_id, display_name, push_token)
               VALUES ($1, $2, $3)
               RETURNING user_id, display_name, push_token, created_at, updated_at"#,
        )
        .bind(user_id)
        .bind(display_name)
        .bind(push_token)
        .fetch_one(pool)
        .await
    }

    /// Push tokens of every user that registered one, keyed by user id
    pub async fn find_push_tokens(pool: &SqlitePool) -> Result<HashMap<Uuid, String>, sqlx::Error> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            r#"SELECT user_id, push_token
               FROM profiles
               WHERE push_token IS NOT NULL AND push_token != ''"#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Display names of every profile, keyed by user id
    pub async fn find_display_names(pool: &SqlitePool) -> Result<HashMap<Uuid, String>, sqlx::Error> {
        let rows: Vec<(Uuid, String)> =
            sqlx::query_as(r#"SELECT user_id, display_name FROM profiles"#)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().collect())
    }
}
