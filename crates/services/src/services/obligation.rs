//! Pact obligation scheduling.
//!
//! Decides, for a pact's frequency and pact type, which participants owe a
//! check-in on a calendar date, which of those obligations are still
//! outstanding, and how many obligations fall inside a date range. Everything
//! here is a pure function of its inputs; the reminder, auto-fold and recap
//! jobs all go through these functions so they always agree on what is due.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};
use db::models::{
    check_in::CheckIn,
    pact::{Pact, PactFrequency, PactType},
    pact_participant::PactParticipant,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::calendar::days_inclusive;
use uuid::Uuid;

/// Which weekday a weekly pact falls due on
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeeklyAnchor {
    /// Every weekly pact is due on Sunday
    #[default]
    Sunday,
    /// Each weekly pact is due on the weekday of its start date
    StartDate,
}

impl WeeklyAnchor {
    fn due_weekday(self, pact: &Pact) -> Weekday {
        match self {
            Self::Sunday => Weekday::Sun,
            Self::StartDate => pact.start_date.weekday(),
        }
    }
}

/// Whether `pact` requires a check-in on `date`.
///
/// Dates outside the pact's start/end window are never due. A custom pact
/// with no weekdays configured is never due.
pub fn is_pact_due(pact: &Pact, date: NaiveDate, anchor: WeeklyAnchor) -> bool {
    if !pact.is_within_window(date) {
        return false;
    }

    match pact.frequency {
        PactFrequency::Daily => true,
        PactFrequency::Weekly => date.weekday() == anchor.due_weekday(pact),
        PactFrequency::Custom => pact.frequency_days.contains_date(date),
    }
}

/// Whether `participant` individually owes the check-in on a date the pact is due.
///
/// Individual and group pacts obligate everyone. Relay pacts only obligate the
/// participant whose relay days include the weekday; a relay participant
/// without relay days is never due.
pub fn is_participant_due(pact: &Pact, participant: &PactParticipant, date: NaiveDate) -> bool {
    match pact.pact_type {
        PactType::Individual | PactType::Group => true,
        PactType::Relay => participant
            .relay_days
            .as_ref()
            .is_some_and(|days| days.contains_date(date)),
    }
}

/// Pact and participant conditions combined
pub fn is_obligated(
    pact: &Pact,
    participant: &PactParticipant,
    date: NaiveDate,
    anchor: WeeklyAnchor,
) -> bool {
    is_pact_due(pact, date, anchor) && is_participant_due(pact, participant, date)
}

/// A participant who owes a check-in that has not been recorded yet
#[derive(Debug, Clone, Copy)]
pub struct Outstanding<'a> {
    pub pact: &'a Pact,
    pub participant: &'a PactParticipant,
}

/// List every (pact, participant) pair that owes a check-in on `date` and
/// has no check-in of any status recorded for it.
///
/// Output follows pact order, then participant order. Check-ins for other
/// dates, or for pacts and users not in the input, are ignored.
pub fn resolve_outstanding<'a>(
    pacts: &'a [Pact],
    participants_by_pact: &'a HashMap<Uuid, Vec<PactParticipant>>,
    check_ins: &[CheckIn],
    date: NaiveDate,
    anchor: WeeklyAnchor,
) -> Vec<Outstanding<'a>> {
    let recorded: HashSet<(Uuid, Uuid)> = check_ins
        .iter()
        .filter(|check_in| check_in.check_in_date == date)
        .map(|check_in| (check_in.pact_id, check_in.user_id))
        .collect();

    pacts
        .iter()
        .filter(|pact| is_pact_due(pact, date, anchor))
        .flat_map(|pact| {
            participants_by_pact
                .get(&pact.id)
                .into_iter()
                .flatten()
                .filter(move |participant| is_participant_due(pact, participant, date))
                .map(move |participant| Outstanding { pact, participant })
        })
        .filter(|outstanding| {
            !recorded.contains(&(outstanding.pact.id, outstanding.participant.user_id))
        })
        .collect()
}

/// Clamp a range to the pact's active window; `None` when they do not overlap
fn clamp_to_window(pact: &Pact, start: NaiveDate, end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = start.max(pact.start_date);
    let end = pact.end_date.map_or(end, |pact_end| end.min(pact_end));
    (start <= end).then_some((start, end))
}

/// Number of dates in `[range_start, range_end]` on which the pact is due.
/// Zero when the range is reversed.
pub fn count_expected_obligations(
    pact: &Pact,
    range_start: NaiveDate,
    range_end: NaiveDate,
    anchor: WeeklyAnchor,
) -> u32 {
    let Some((start, end)) = clamp_to_window(pact, range_start, range_end) else {
        return 0;
    };
    days_inclusive(start, end)
        .filter(|date| is_pact_due(pact, *date, anchor))
        .count() as u32
}

/// Dates in the range on which this participant personally owes a check-in,
/// yielded lazily in ascending order
pub fn participant_due_dates<'a>(
    pact: &'a Pact,
    participant: &'a PactParticipant,
    range_start: NaiveDate,
    range_end: NaiveDate,
    anchor: WeeklyAnchor,
) -> impl Iterator<Item = NaiveDate> + 'a {
    clamp_to_window(pact, range_start, range_end)
        .into_iter()
        .flat_map(|(start, end)| days_inclusive(start, end))
        .filter(move |date| is_obligated(pact, participant, *date, anchor))
}

/// Like [`count_expected_obligations`], narrowed to a relay participant's turns
pub fn count_participant_obligations(
    pact: &Pact,
    participant: &PactParticipant,
    range_start: NaiveDate,
    range_end: NaiveDate,
    anchor: WeeklyAnchor,
) -> u32 {
    participant_due_dates(pact, participant, range_start, range_end, anchor).count() as u32
}

/// `successes / expected`, clamped to `0.0..=1.0`. Zero when nothing was expected.
pub fn completion_rate(successes: u32, expected: u32) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    (f64::from(successes) / f64::from(expected)).clamp(0.0, 1.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Utc;
    use db::models::{
        check_in::CheckInStatus,
        pact::PactStatus,
        weekday_set::WeekdaySet,
    };

    use super::*;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn pact(frequency: PactFrequency, days: &[u8], pact_type: PactType) -> Pact {
        Pact {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            name: "Morning run".to_string(),
            frequency,
            frequency_days: WeekdaySet::new(days.iter().copied()),
            pact_type,
            roast_level: 2,
            start_date: date(2024, 1, 1), // Monday
            end_date: None,
            status: PactStatus::Active,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn participant(pact: &Pact, relay_days: Option<&[u8]>) -> PactParticipant {
        PactParticipant {
            id: Uuid::new_v4(),
            pact_id: pact.id,
            user_id: Uuid::new_v4(),
            relay_days: relay_days.map(|days| WeekdaySet::new(days.iter().copied())),
            joined_at: Utc::now(),
        }
    }

    pub(crate) fn check_in(
        pact: &Pact,
        participant: &PactParticipant,
        status: CheckInStatus,
        on: NaiveDate,
    ) -> CheckIn {
        CheckIn {
            id: Uuid::new_v4(),
            pact_id: pact.id,
            user_id: participant.user_id,
            status,
            excuse: None,
            proof_url: None,
            check_in_date: on,
            is_late: false,
            created_at: Utc::now(),
        }
    }

    fn roster(pact: &Pact, participants: &[PactParticipant]) -> HashMap<Uuid, Vec<PactParticipant>> {
        HashMap::from([(pact.id, participants.to_vec())])
    }

    #[test]
    fn test_daily_pact_due_every_day_in_window() {
        let mut daily = pact(PactFrequency::Daily, &[], PactType::Individual);
        daily.end_date = Some(date(2024, 1, 31));

        assert!(
            days_inclusive(date(2024, 1, 1), date(2024, 1, 31))
                .all(|day| is_pact_due(&daily, day, WeeklyAnchor::Sunday))
        );
        assert!(!is_pact_due(&daily, date(2023, 12, 31), WeeklyAnchor::Sunday));
        assert!(!is_pact_due(&daily, date(2024, 2, 1), WeeklyAnchor::Sunday));
    }

    #[test]
    fn test_custom_pact_due_on_configured_weekdays_only() {
        let custom = pact(PactFrequency::Custom, &[1, 3, 5], PactType::Individual);

        // Four weeks starting Monday 2024-01-01, crossing three week boundaries
        let due: Vec<NaiveDate> = days_inclusive(date(2024, 1, 1), date(2024, 1, 28))
            .filter(|day| is_pact_due(&custom, *day, WeeklyAnchor::Sunday))
            .collect();

        assert_eq!(due.len(), 12);
        assert!(due.iter().all(|day| matches!(
            day.weekday(),
            Weekday::Mon | Weekday::Wed | Weekday::Fri
        )));
        assert_eq!(due[0], date(2024, 1, 1));
        assert_eq!(due[3], date(2024, 1, 8));
    }

    #[test]
    fn test_custom_pact_without_days_is_never_due() {
        let custom = pact(PactFrequency::Custom, &[], PactType::Individual);
        assert_eq!(
            count_expected_obligations(&custom, date(2024, 1, 1), date(2024, 3, 1), WeeklyAnchor::Sunday),
            0
        );
    }

    #[test]
    fn test_weekly_pact_sunday_anchor() {
        let weekly = pact(PactFrequency::Weekly, &[], PactType::Group);
        // Started on a Monday, but the Sunday anchor ignores that
        assert!(!is_pact_due(&weekly, date(2024, 1, 1), WeeklyAnchor::Sunday));
        assert!(is_pact_due(&weekly, date(2024, 1, 7), WeeklyAnchor::Sunday));
        assert!(is_pact_due(&weekly, date(2024, 1, 14), WeeklyAnchor::Sunday));
    }

    #[test]
    fn test_weekly_pact_start_date_anchor() {
        let weekly = pact(PactFrequency::Weekly, &[], PactType::Group);
        assert!(is_pact_due(&weekly, date(2024, 1, 1), WeeklyAnchor::StartDate));
        assert!(is_pact_due(&weekly, date(2024, 1, 8), WeeklyAnchor::StartDate));
        assert!(!is_pact_due(&weekly, date(2024, 1, 7), WeeklyAnchor::StartDate));
    }

    #[test]
    fn test_relay_narrows_obligation_to_assigned_participant() {
        let relay = pact(PactFrequency::Daily, &[], PactType::Relay);
        let alice = participant(&relay, Some(&[1, 3, 5]));
        let bob = participant(&relay, Some(&[2, 4]));
        let monday = date(2024, 1, 8);

        assert!(is_participant_due(&relay, &alice, monday));
        assert!(!is_participant_due(&relay, &bob, monday));

        let by_pact = roster(&relay, &[alice.clone(), bob.clone()]);
        let pacts = vec![relay.clone()];
        let outstanding = resolve_outstanding(&pacts, &by_pact, &[], monday, WeeklyAnchor::Sunday);
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].participant.user_id, alice.user_id);
    }

    #[test]
    fn test_relay_participant_without_days_never_due() {
        let relay = pact(PactFrequency::Daily, &[], PactType::Relay);
        let unassigned = participant(&relay, None);
        let empty = participant(&relay, Some(&[]));

        assert!(
            days_inclusive(date(2024, 1, 1), date(2024, 1, 7))
                .all(|day| !is_participant_due(&relay, &unassigned, day)
                    && !is_participant_due(&relay, &empty, day))
        );
    }

    #[test]
    fn test_relay_unclaimed_weekday_has_no_obligation() {
        let relay = pact(PactFrequency::Daily, &[], PactType::Relay);
        let alice = participant(&relay, Some(&[1]));
        let pacts = vec![relay.clone()];
        let by_pact = roster(&relay, &[alice]);

        // 2024-01-09 is a Tuesday; nobody holds the baton
        let outstanding =
            resolve_outstanding(&pacts, &by_pact, &[], date(2024, 1, 9), WeeklyAnchor::Sunday);
        assert!(outstanding.is_empty());
    }

    #[test]
    fn test_non_relay_pact_ignores_relay_days() {
        let group = pact(PactFrequency::Daily, &[], PactType::Group);
        let member = participant(&group, Some(&[1]));
        assert!(is_participant_due(&group, &member, date(2024, 1, 9)));
    }

    #[test]
    fn test_resolve_outstanding_end_to_end() {
        let custom = pact(PactFrequency::Custom, &[1, 3, 5], PactType::Individual);
        let alice = participant(&custom, None);
        let pacts = vec![custom.clone()];
        let by_pact = roster(&custom, &[alice.clone()]);
        let wednesday = date(2024, 1, 3);

        let outstanding = resolve_outstanding(&pacts, &by_pact, &[], wednesday, WeeklyAnchor::Sunday);
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].pact.id, custom.id);
        assert_eq!(outstanding[0].participant.user_id, alice.user_id);

        let check_ins = vec![check_in(&custom, &alice, CheckInStatus::Success, wednesday)];
        let outstanding =
            resolve_outstanding(&pacts, &by_pact, &check_ins, wednesday, WeeklyAnchor::Sunday);
        assert!(outstanding.is_empty());
    }

    #[test]
    fn test_resolve_outstanding_is_idempotent_after_folds() {
        let daily = pact(PactFrequency::Daily, &[], PactType::Group);
        let members = vec![participant(&daily, None), participant(&daily, None)];
        let pacts = vec![daily.clone()];
        let by_pact = roster(&daily, &members);
        let yesterday = date(2024, 1, 10);

        let first = resolve_outstanding(&pacts, &by_pact, &[], yesterday, WeeklyAnchor::Sunday);
        assert_eq!(first.len(), 2);

        let folds: Vec<CheckIn> = first
            .iter()
            .map(|o| check_in(o.pact, o.participant, CheckInStatus::Fold, yesterday))
            .collect();
        let second = resolve_outstanding(&pacts, &by_pact, &folds, yesterday, WeeklyAnchor::Sunday);
        assert!(second.is_empty());
    }

    #[test]
    fn test_resolve_outstanding_ignores_other_dates_and_unknown_pacts() {
        let daily = pact(PactFrequency::Daily, &[], PactType::Individual);
        let other = pact(PactFrequency::Daily, &[], PactType::Individual);
        let alice = participant(&daily, None);
        let stranger = participant(&other, None);
        let pacts = vec![daily.clone()];
        let by_pact = roster(&daily, &[alice.clone()]);
        let today = date(2024, 1, 10);

        let check_ins = vec![
            check_in(&daily, &alice, CheckInStatus::Success, date(2024, 1, 9)),
            check_in(&other, &stranger, CheckInStatus::Success, today),
        ];
        let outstanding = resolve_outstanding(&pacts, &by_pact, &check_ins, today, WeeklyAnchor::Sunday);
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].participant.user_id, alice.user_id);
    }

    #[test]
    fn test_resolve_outstanding_skips_pacts_not_due() {
        let custom = pact(PactFrequency::Custom, &[1], PactType::Individual);
        let alice = participant(&custom, None);
        let pacts = vec![custom.clone()];
        let by_pact = roster(&custom, &[alice]);

        let outstanding =
            resolve_outstanding(&pacts, &by_pact, &[], date(2024, 1, 2), WeeklyAnchor::Sunday);
        assert!(outstanding.is_empty());
    }

    #[test]
    fn test_window_counter_single_day_boundaries() {
        let mut daily = pact(PactFrequency::Daily, &[], PactType::Individual);
        daily.end_date = Some(date(2024, 1, 31));
        let anchor = WeeklyAnchor::Sunday;

        let inside = date(2024, 1, 15);
        assert_eq!(count_expected_obligations(&daily, inside, inside, anchor), 1);
        let start = date(2024, 1, 1);
        assert_eq!(count_expected_obligations(&daily, start, start, anchor), 1);
        let end = date(2024, 1, 31);
        assert_eq!(count_expected_obligations(&daily, end, end, anchor), 1);

        let before = date(2023, 12, 31);
        assert_eq!(count_expected_obligations(&daily, before, before, anchor), 0);
        let after = date(2024, 2, 1);
        assert_eq!(count_expected_obligations(&daily, after, after, anchor), 0);
    }

    #[test]
    fn test_window_counter_reversed_range_is_zero() {
        let daily = pact(PactFrequency::Daily, &[], PactType::Individual);
        assert_eq!(
            count_expected_obligations(&daily, date(2024, 1, 10), date(2024, 1, 5), WeeklyAnchor::Sunday),
            0
        );
    }

    #[test]
    fn test_window_counter_clamps_to_pact_window() {
        let mut daily = pact(PactFrequency::Daily, &[], PactType::Individual);
        daily.end_date = Some(date(2024, 1, 10));
        assert_eq!(
            count_expected_obligations(&daily, date(2023, 1, 1), date(2025, 1, 1), WeeklyAnchor::Sunday),
            10
        );
    }

    #[test]
    fn test_participant_obligations_follow_relay_turns() {
        let relay = pact(PactFrequency::Daily, &[], PactType::Relay);
        let alice = participant(&relay, Some(&[1, 3, 5]));
        let bob = participant(&relay, Some(&[2, 4]));
        let (start, end) = (date(2024, 1, 1), date(2024, 1, 14));

        assert_eq!(count_expected_obligations(&relay, start, end, WeeklyAnchor::Sunday), 14);
        assert_eq!(count_participant_obligations(&relay, &alice, start, end, WeeklyAnchor::Sunday), 6);
        assert_eq!(count_participant_obligations(&relay, &bob, start, end, WeeklyAnchor::Sunday), 4);
    }

    #[test]
    fn test_completion_rate_bounds() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(3, 0), 0.0);
        assert_eq!(completion_rate(0, 4), 0.0);
        assert_eq!(completion_rate(2, 4), 0.5);
        assert_eq!(completion_rate(4, 4), 1.0);
        assert_eq!(completion_rate(5, 4), 1.0);

        for expected in 0..10u32 {
            for successes in 0..=expected {
                let rate = completion_rate(successes, expected);
                assert!((0.0..=1.0).contains(&rate));
            }
        }
    }

    #[test]
    fn test_weekly_anchor_parses_from_config_strings() {
        assert_eq!("sunday".parse::<WeeklyAnchor>().unwrap(), WeeklyAnchor::Sunday);
        assert_eq!("start_date".parse::<WeeklyAnchor>().unwrap(), WeeklyAnchor::StartDate);
        assert!("monday".parse::<WeeklyAnchor>().is_err());
    }
}
