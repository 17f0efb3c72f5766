//! Loads the pacts, rosters and check-ins the obligation resolver works on.

use std::collections::HashMap;

use chrono::NaiveDate;
use db::models::{
    check_in::CheckIn,
    pact::{Pact, PactStatus},
    pact_participant::PactParticipant,
};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::obligation::{Outstanding, WeeklyAnchor, resolve_outstanding};

/// Everything needed to resolve one day's obligations
#[derive(Debug, Clone)]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub pacts: Vec<Pact>,
    pub participants_by_pact: HashMap<Uuid, Vec<PactParticipant>>,
    pub check_ins: Vec<CheckIn>,
}

impl DaySnapshot {
    /// Load active pacts (or the single pact `pact_id`) with their rosters and
    /// the check-ins already recorded for `date`.
    ///
    /// Returns `Ok(None)` when `pact_id` does not exist. An archived pact loads
    /// as an empty snapshot.
    pub async fn load(
        pool: &SqlitePool,
        date: NaiveDate,
        pact_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let (pacts, participants_by_pact) = match pact_id {
            Some(id) => {
                let Some(pact) = Pact::find_by_id(pool, id).await? else {
                    return Ok(None);
                };
                if pact.status != PactStatus::Active {
                    (Vec::new(), HashMap::new())
                } else {
                    let participants = PactParticipant::find_by_pact_id(pool, id).await?;
                    (vec![pact], HashMap::from([(id, participants)]))
                }
            }
            None => (
                Pact::find_active(pool).await?,
                PactParticipant::find_for_active_pacts(pool).await?,
            ),
        };

        let check_ins = if pacts.is_empty() {
            Vec::new()
        } else {
            CheckIn::find_by_date(pool, date).await?
        };

        Ok(Some(Self {
            date,
            pacts,
            participants_by_pact,
            check_ins,
        }))
    }

    pub fn outstanding(&self, anchor: WeeklyAnchor) -> Vec<Outstanding<'_>> {
        resolve_outstanding(
            &self.pacts,
            &self.participants_by_pact,
            &self.check_ins,
            self.date,
            anchor,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use db::{
        DBService,
        models::{
            check_in::{CheckInStatus, CreateCheckIn},
            pact::{CreatePact, PactFrequency, PactType},
            weekday_set::WeekdaySet,
        },
    };

    use super::*;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) async fn test_db() -> DBService {
        DBService::new_in_memory().await.unwrap()
    }

    /// Pact starting Monday 2024-01-01 with one participant per entry in `relay_days`
    pub(crate) async fn seed_pact(
        pool: &SqlitePool,
        frequency: PactFrequency,
        frequency_days: &[u8],
        pact_type: PactType,
        relay_days: &[Option<&[u8]>],
    ) -> (Pact, Vec<PactParticipant>) {
        let data = CreatePact {
            frequency,
            frequency_days: Some(WeekdaySet::new(frequency_days.iter().copied())),
            pact_type: Some(pact_type),
            ..CreatePact::daily(Uuid::new_v4(), "Morning run", date(2024, 1, 1), Uuid::new_v4())
        };
        let pact = Pact::create(pool, &data, Uuid::new_v4()).await.unwrap();

        let mut participants = Vec::new();
        for days in relay_days {
            let relay = days.map(|d| WeekdaySet::new(d.iter().copied()));
            participants.push(
                PactParticipant::create(pool, pact.id, Uuid::new_v4(), relay)
                    .await
                    .unwrap(),
            );
        }
        (pact, participants)
    }

    pub(crate) async fn record(
        pool: &SqlitePool,
        pact: &Pact,
        participant: &PactParticipant,
        status: CheckInStatus,
        on: NaiveDate,
    ) -> CheckIn {
        let mut data = CreateCheckIn::success(pact.id, participant.user_id, on);
        data.status = status;
        CheckIn::create(pool, &data, Uuid::new_v4()).await.unwrap()
    }

    #[tokio::test]
    async fn test_load_reads_active_pacts_and_day_check_ins() {
        let db = test_db().await;
        let (pact, members) =
            seed_pact(&db.pool, PactFrequency::Daily, &[], PactType::Group, &[None, None]).await;
        let (archived, _) =
            seed_pact(&db.pool, PactFrequency::Daily, &[], PactType::Group, &[None]).await;
        Pact::update_status(&db.pool, archived.id, PactStatus::Archived)
            .await
            .unwrap();
        record(&db.pool, &pact, &members[0], CheckInStatus::Success, date(2024, 1, 3)).await;
        record(&db.pool, &pact, &members[1], CheckInStatus::Success, date(2024, 1, 4)).await;

        let snapshot = DaySnapshot::load(&db.pool, date(2024, 1, 3), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.pacts.len(), 1);
        assert_eq!(snapshot.participants_by_pact[&pact.id].len(), 2);
        assert!(!snapshot.participants_by_pact.contains_key(&archived.id));
        assert_eq!(snapshot.check_ins.len(), 1);

        let outstanding = snapshot.outstanding(WeeklyAnchor::Sunday);
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].participant.user_id, members[1].user_id);
    }

    #[tokio::test]
    async fn test_load_single_pact() {
        let db = test_db().await;
        let (pact, _) =
            seed_pact(&db.pool, PactFrequency::Daily, &[], PactType::Group, &[None]).await;
        seed_pact(&db.pool, PactFrequency::Daily, &[], PactType::Group, &[None]).await;

        let snapshot = DaySnapshot::load(&db.pool, date(2024, 1, 3), Some(pact.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.pacts.len(), 1);
        assert_eq!(snapshot.pacts[0].id, pact.id);

        let missing = DaySnapshot::load(&db.pool, date(2024, 1, 3), Some(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_relay_days_survive_round_trip_through_store() {
        let db = test_db().await;
        let (pact, members) = seed_pact(
            &db.pool,
            PactFrequency::Daily,
            &[],
            PactType::Relay,
            &[Some(&[1, 3, 5]), None],
        )
        .await;

        let loaded = PactParticipant::find_by_pact_id(&db.pool, pact.id).await.unwrap();
        let alice = loaded.iter().find(|p| p.user_id == members[0].user_id).unwrap();
        let bob = loaded.iter().find(|p| p.user_id == members[1].user_id).unwrap();
        assert_eq!(alice.relay_days.as_ref().map(|d| d.days().to_vec()), Some(vec![1, 3, 5]));
        assert!(bob.relay_days.is_none());
    }
}
