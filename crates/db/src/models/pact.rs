use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::weekday_set::WeekdaySet;

/// How often a pact expects a check-in
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "pact_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PactFrequency {
    Daily,
    Weekly,
    /// Due on the weekdays listed in `frequency_days`
    Custom,
}

/// Who carries the obligation on a due date
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "pact_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PactType {
    #[default]
    Individual,
    Group,
    /// Obligation rotates across participants by their assigned relay days
    Relay,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "pact_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PactStatus {
    #[default]
    Active,
    Archived,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Pact {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub frequency: PactFrequency,
    pub frequency_days: WeekdaySet, // Only meaningful for custom frequency
    pub pact_type: PactType,
    pub roast_level: i32, // 1 (mild) .. 3 (extra crispy)
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: PactStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePact {
    pub group_id: Uuid,
    pub name: String,
    pub frequency: PactFrequency,
    pub frequency_days: Option<WeekdaySet>,
    pub pact_type: Option<PactType>,
    pub roast_level: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_by: Uuid,
}

impl CreatePact {
    pub fn daily(group_id: Uuid, name: impl Into<String>, start_date: NaiveDate, created_by: Uuid) -> Self {
        Self {
            group_id,
            name: name.into(),
            frequency: PactFrequency::Daily,
            frequency_days: None,
            pact_type: None,
            roast_level: None,
            start_date,
            end_date: None,
            created_by,
        }
    }

    /// Weekday numbers are only kept for custom pacts
    fn stored_frequency_days(&self) -> WeekdaySet {
        match self.frequency {
            PactFrequency::Custom => self.frequency_days.clone().unwrap_or_default(),
            PactFrequency::Daily | PactFrequency::Weekly => WeekdaySet::default(),
        }
    }
}

impl Pact {
    /// Whether `date` falls inside the pact's inclusive start/end window
    pub fn is_within_window(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.is_none_or(|end| date <= end)
    }

    pub async fn create(pool: &SqlitePool, data: &CreatePact, id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Pact>(
            r#"INSERT INTO pacts (id, group_id, name, frequency, frequency_days, pact_type, roast_level, start_date, end_date, created_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING id, group_id, name, frequency, frequency_days, pact_type, roast_level, start_date, end_date, status, created_by, created_at"#,
        )
        .bind(id)
        .bind(data.group_id)
        .bind(&data.name)
        .bind(data.frequency)
        .bind(data.stored_frequency_days())
        .bind(data.pact_type.unwrap_or_default())
        .bind(data.roast_level.unwrap_or(2))
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Pact>(
            r#"SELECT id, group_id, name, frequency, frequency_days, pact_type, roast_level, start_date, end_date, status, created_by, created_at
               FROM pacts
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// All pacts that have not been archived, oldest first
    pub async fn find_active(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Pact>(
            r#"SELECT id, group_id, name, frequency, frequency_days, pact_type, roast_level, start_date, end_date, status, created_by, created_at
               FROM pacts
               WHERE status = 'active'
               ORDER BY created_at ASC, id ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: PactStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pacts SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(pool)
            .await?;
        Ok(())
    }
}
