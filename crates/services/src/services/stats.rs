//! Completion statistics and leaderboards over a date range.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use chrono::NaiveDate;
use db::models::{
    check_in::{CheckIn, CheckInStatus},
    pact::Pact,
    pact_participant::PactParticipant,
    weekly_recap::{ParticipantRecap, RecapData},
};
use uuid::Uuid;

use super::obligation::{
    WeeklyAnchor, completion_rate, count_expected_obligations, participant_due_dates,
};

/// Score one participant over `[start, end]`.
///
/// Only check-ins that land on one of the participant's due dates count, so
/// successes never exceed expected obligations. The streak counts consecutive
/// successful due dates up to the last due date in the range.
pub fn participant_recap(
    pact: &Pact,
    participant: &PactParticipant,
    check_ins: &[CheckIn],
    start: NaiveDate,
    end: NaiveDate,
    anchor: WeeklyAnchor,
) -> ParticipantRecap {
    let mut succeeded: HashSet<NaiveDate> = HashSet::new();
    let mut folded: HashSet<NaiveDate> = HashSet::new();
    for check_in in check_ins
        .iter()
        .filter(|c| c.pact_id == pact.id && c.user_id == participant.user_id)
    {
        match check_in.status {
            CheckInStatus::Success => succeeded.insert(check_in.check_in_date),
            CheckInStatus::Fold => folded.insert(check_in.check_in_date),
        };
    }

    let mut expected = 0u32;
    let mut successes = 0u32;
    let mut folds = 0u32;
    let mut current_streak = 0u32;
    for date in participant_due_dates(pact, participant, start, end, anchor) {
        expected += 1;
        if succeeded.contains(&date) {
            successes += 1;
            current_streak += 1;
        } else {
            current_streak = 0;
        }
        if folded.contains(&date) {
            folds += 1;
        }
    }

    ParticipantRecap {
        user_id: participant.user_id,
        display_name: None,
        rank: 0,
        expected_obligations: expected,
        successes,
        folds,
        completion_rate: completion_rate(successes, expected),
        current_streak,
    }
}

fn leaderboard_order(a: &ParticipantRecap, b: &ParticipantRecap) -> Ordering {
    b.completion_rate
        .total_cmp(&a.completion_rate)
        .then_with(|| b.successes.cmp(&a.successes))
        .then_with(|| b.current_streak.cmp(&a.current_streak))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Sort best-first and assign competition ranks (1, 1, 3, ...).
/// Participants tie when completion rate and successes match.
pub fn rank_participants(recaps: &mut [ParticipantRecap]) {
    recaps.sort_by(leaderboard_order);

    let mut previous: Option<(f64, u32, u32)> = None;
    for (index, recap) in recaps.iter_mut().enumerate() {
        let rank = match previous {
            Some((rate, successes, rank))
                if rate == recap.completion_rate && successes == recap.successes =>
            {
                rank
            }
            _ => index as u32 + 1,
        };
        recap.rank = rank;
        previous = Some((recap.completion_rate, recap.successes, rank));
    }
}

/// Build the ranked recap of a pact for `[start, end]`
pub fn build_recap(
    pact: &Pact,
    participants: &[PactParticipant],
    check_ins: &[CheckIn],
    display_names: &HashMap<Uuid, String>,
    start: NaiveDate,
    end: NaiveDate,
    anchor: WeeklyAnchor,
) -> RecapData {
    let mut recaps: Vec<ParticipantRecap> = participants
        .iter()
        .map(|participant| {
            let mut recap = participant_recap(pact, participant, check_ins, start, end, anchor);
            recap.display_name = display_names.get(&participant.user_id).cloned();
            recap
        })
        .collect();
    rank_participants(&mut recaps);

    RecapData {
        pact_name: pact.name.clone(),
        week_start: start,
        week_end: end,
        expected_obligations: count_expected_obligations(pact, start, end, anchor),
        participants: recaps,
    }
}
