use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, TournamentError};
use crate::score::decisive_score;
use crate::types::{
  BracketMatch, Division, PlayoffTeam, Side, BYE_SCORE, DEFAULT_UPPER_COURTS, MAX_BYES, WALKOVER_SCORE,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BracketOptions {
  pub requested_byes: usize,
  pub courts: Vec<u32>,
  pub third_place: bool,
}

impl Default for BracketOptions {
  fn default() -> Self {
    BracketOptions {
      requested_byes: 0,
      courts: DEFAULT_UPPER_COURTS.to_vec(),
      third_place: false,
    }
  }
}

/// Canonical slot order: `[1]`, `[1, 2]`, then every seed `s` of the
/// half-size order expands to `(s, n + 1 - s)`.
pub fn seed_order(size: usize) -> Vec<u32> {
  let mut seeds = vec![1u32];
  while seeds.len() < size {
    let n = seeds.len() as u32;
    let mut next = Vec::with_capacity(seeds.len() * 2);
    for seed in seeds.iter().copied() {
      next.push(seed);
      next.push((n * 2 + 1).saturating_sub(seed));
    }
    seeds = next;
  }
  seeds
}

pub fn bracket_size(team_count: usize) -> usize {
  team_count.max(1).next_power_of_two()
}

/// `min(max(structural, requested), MAX_BYES, bracket size)`
pub fn effective_byes(team_count: usize, requested: usize) -> usize {
  let size = bracket_size(team_count);
  let structural = size - team_count.min(size);
  structural.max(requested).min(MAX_BYES).min(size)
}

pub fn match_id(division: Division, round: u32, slot: u32) -> String {
  format!("{}-R{}-M{}", division.prefix(), round, slot)
}

fn court_for_slot(courts: &[u32], slot: u32) -> u32 {
  courts[(slot as usize - 1) % courts.len()]
}

fn side_for_slot(slot: u32) -> Side {
  if slot % 2 == 1 {
    Side::Team1
  } else {
    Side::Team2
  }
}

/// Single-elimination bracket for one division. Teams are re-seeded 1..N
/// in their seed order, placed by `seed_order`, and every round-1 match
/// holding a single team is resolved before the bracket is returned.
pub fn build_bracket(teams: &[PlayoffTeam], division: Division, options: &BracketOptions) -> Result<Vec<BracketMatch>> {
  if teams.len() < 2 {
    return Err(TournamentError::NotEnoughTeams {
      division,
      count: teams.len(),
    });
  }
  if options.courts.is_empty() {
    return Err(TournamentError::InvalidOption(format!("{division} court pool is empty")));
  }

  let mut seeded = teams.to_vec();
  seeded.sort_by_key(|team| team.seed);
  let seed_map = seeded
    .into_iter()
    .enumerate()
    .map(|(idx, mut team)| {
      team.seed = idx as u32 + 1;
      team.division = division;
      (team.seed, team)
    })
    .collect::<HashMap<_, _>>();

  let size = bracket_size(teams.len());
  let rounds = size.trailing_zeros();
  let order = seed_order(size);

  let mut matches = Vec::new();
  for round in 1..=rounds {
    let count = (size >> round) as u32;
    for slot in 1..=count {
      let mut m = BracketMatch::new(match_id(division, round, slot), division, round, slot);
      m.court = Some(court_for_slot(&options.courts, slot));
      if round < rounds {
        m.winner_target_match_id = Some(match_id(division, round + 1, slot.div_ceil(2)));
        m.winner_target_side = Some(side_for_slot(slot));
      }
      if round == 1 {
        let pos = (slot as usize - 1) * 2;
        m.team1 = seed_map.get(&order[pos]).cloned();
        m.team2 = seed_map.get(&order[pos + 1]).cloned();
      }
      matches.push(m);
    }
  }

  // Semifinals in round 1 may hold byes, which would leave the
  // consolation match one team short.
  if options.third_place && rounds >= 2 && (rounds > 2 || teams.len() == size) {
    let id = match_id(division, rounds, 2);
    let mut consolation = BracketMatch::new(id.clone(), division, rounds, 2);
    consolation.court = Some(court_for_slot(&options.courts, 2));
    for m in matches.iter_mut().filter(|m| m.round == rounds - 1) {
      m.loser_target_match_id = Some(id.clone());
      m.loser_target_side = Some(side_for_slot(m.slot));
    }
    matches.push(consolation);
  }

  let byes = effective_byes(teams.len(), options.requested_byes);
  resolve_round_one(&mut matches, byes);
  tracing::debug!(%division, teams = teams.len(), size, byes, matches = matches.len(), "built bracket");
  Ok(matches)
}

fn resolve_round_one(matches: &mut [BracketMatch], byes: usize) {
  let index = index_by_id(matches);
  for idx in 0..matches.len() {
    if matches[idx].round != 1 {
      continue;
    }
    let lone = match (&matches[idx].team1, &matches[idx].team2) {
      (Some(team), None) | (None, Some(team)) => team.clone(),
      _ => continue,
    };
    let target = matches[idx]
      .winner_target()
      .map(|(id, side)| (id.to_string(), side));
    if lone.seed as usize <= byes {
      let m = &mut matches[idx];
      m.team1 = None;
      m.team2 = None;
      m.score = Some(BYE_SCORE.to_string());
    } else {
      tracing::warn!(team = %lone.display_name, seed = lone.seed, "lone team past the bye cap advances by walkover");
      matches[idx].score = Some(WALKOVER_SCORE.to_string());
    }
    if let Some((id, side)) = target {
      if let Some(parent) = index.get(&id).copied() {
        matches[parent].set_team(side, Some(lone));
      }
    }
  }
}

fn index_by_id(matches: &[BracketMatch]) -> HashMap<String, usize> {
  matches
    .iter()
    .enumerate()
    .map(|(idx, m)| (m.id.clone(), idx))
    .collect()
}

/// `(winner, loser)` of a match holding two teams and a decisive score.
pub fn decided(m: &BracketMatch) -> Option<(&PlayoffTeam, &PlayoffTeam)> {
  let (a, b) = decisive_score(m.score.as_deref()?)?;
  let (team1, team2) = (m.team1.as_ref()?, m.team2.as_ref()?);
  if a > b {
    Some((team1, team2))
  } else {
    Some((team2, team1))
  }
}

/// Records `text` on a match and returns the updated bracket list. The
/// winner moves to the winner target, the loser to the loser target.
/// Blank text clears the result. Any slot that changes drops whatever
/// was decided downstream of it.
pub fn record_bracket_score(matches: &[BracketMatch], match_id: &str, text: &str) -> Result<Vec<BracketMatch>> {
  let mut next = matches.to_vec();
  let index = index_by_id(&next);
  let idx = index
    .get(match_id)
    .copied()
    .ok_or_else(|| TournamentError::MatchNotFound(match_id.to_string()))?;
  if next[idx].is_bye() || next[idx].is_walkover() {
    return Err(TournamentError::MatchNotReady(match_id.to_string()));
  }

  let text = text.trim();
  if text.is_empty() {
    retract(&mut next, &index, idx);
    return Ok(next);
  }
  if !next[idx].has_both_teams() {
    return Err(TournamentError::MatchNotReady(match_id.to_string()));
  }
  if decisive_score(text).is_none() {
    return Err(TournamentError::UnparseableScore(text.to_string()));
  }

  next[idx].score = Some(text.to_string());
  let (winner, loser) = match decided(&next[idx]) {
    Some((winner, loser)) => (winner.clone(), loser.clone()),
    None => return Err(TournamentError::UnparseableScore(text.to_string())),
  };
  let winner_target = next[idx].winner_target().map(|(id, side)| (id.to_string(), side));
  let loser_target = next[idx].loser_target().map(|(id, side)| (id.to_string(), side));
  place(&mut next, &index, winner_target, Some(winner));
  place(&mut next, &index, loser_target, Some(loser));
  tracing::debug!(match_id, score = text, "recorded bracket score");
  Ok(next)
}

fn place(matches: &mut [BracketMatch], index: &HashMap<String, usize>, target: Option<(String, Side)>, team: Option<PlayoffTeam>) {
  let Some((id, side)) = target else {
    return;
  };
  let Some(idx) = index.get(&id).copied() else {
    return;
  };
  let current = matches[idx].team(side).map(|t| t.id.clone());
  if current == team.as_ref().map(|t| t.id.clone()) {
    return;
  }
  retract(matches, index, idx);
  matches[idx].set_team(side, team);
}

fn retract(matches: &mut [BracketMatch], index: &HashMap<String, usize>, idx: usize) {
  if matches[idx].score.take().is_none() {
    return;
  }
  let winner_target = matches[idx].winner_target().map(|(id, side)| (id.to_string(), side));
  let loser_target = matches[idx].loser_target().map(|(id, side)| (id.to_string(), side));
  place(matches, index, winner_target, None);
  place(matches, index, loser_target, None);
}

/// Winner of the division's final once it has been scored.
pub fn bracket_champion(matches: &[BracketMatch], division: Division) -> Option<&PlayoffTeam> {
  let final_match = matches
    .iter()
    .filter(|m| m.division == division && m.slot == 1)
    .max_by_key(|m| m.round)?;
  decided(final_match).map(|(winner, _)| winner)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn teams(count: usize) -> Vec<PlayoffTeam> {
    (1..=count)
      .map(|seed| {
        let mut team = PlayoffTeam::new(format!("U-T{seed}"), format!("Guy{seed}"), format!("Girl{seed}"), Division::Upper);
        team.seed = seed as u32;
        team
      })
      .collect()
  }

  fn get<'a>(matches: &'a [BracketMatch], id: &str) -> &'a BracketMatch {
    matches.iter().find(|m| m.id == id).unwrap()
  }

  fn seed_of(team: Option<&PlayoffTeam>) -> Option<u32> {
    team.map(|t| t.seed)
  }

  #[test]
  fn test_seed_order_folds() {
    assert_eq!(seed_order(1), vec![1]);
    assert_eq!(seed_order(2), vec![1, 2]);
    assert_eq!(seed_order(4), vec![1, 4, 2, 3]);
    assert_eq!(seed_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
  }

  #[test]
  fn test_bye_computation() {
    assert_eq!(bracket_size(5), 8);
    assert_eq!(effective_byes(5, 1), 3);
    assert_eq!(effective_byes(8, 2), 2);
    assert_eq!(effective_byes(9, 0), 5);
    assert_eq!(effective_byes(2, 5), 2);
    assert_eq!(effective_byes(4, 9), 4);
  }

  #[test]
  fn test_structure_and_pointers() {
    let bracket = build_bracket(&teams(8), Division::Upper, &BracketOptions::default()).unwrap();
    assert_eq!(bracket.len(), 7);
    let first = get(&bracket, "U-R1-M1");
    assert_eq!(seed_of(first.team1.as_ref()), Some(1));
    assert_eq!(seed_of(first.team2.as_ref()), Some(8));
    assert_eq!(first.winner_target(), Some(("U-R2-M1", Side::Team1)));
    assert_eq!(get(&bracket, "U-R1-M2").winner_target(), Some(("U-R2-M1", Side::Team2)));
    assert_eq!(get(&bracket, "U-R2-M2").winner_target(), Some(("U-R3-M1", Side::Team2)));
    assert_eq!(get(&bracket, "U-R3-M1").winner_target(), None);
  }

  #[test]
  fn test_courts_cycle_through_pool() {
    let options = BracketOptions {
      courts: vec![6, 7, 8],
      ..BracketOptions::default()
    };
    let bracket = build_bracket(&teams(16), Division::Lower, &options).unwrap();
    let courts = bracket
      .iter()
      .filter(|m| m.round == 1)
      .map(|m| m.court.unwrap())
      .collect::<Vec<_>>();
    assert_eq!(courts, vec![6, 7, 8, 6, 7, 8, 6, 7]);
    assert_eq!(get(&bracket, "L-R4-M1").court, Some(6));
  }

  #[test]
  fn test_byes_advance_top_seeds() {
    let options = BracketOptions {
      requested_byes: 1,
      ..BracketOptions::default()
    };
    let bracket = build_bracket(&teams(5), Division::Upper, &options).unwrap();
    for id in ["U-R1-M1", "U-R1-M3", "U-R1-M4"] {
      let m = get(&bracket, id);
      assert!(m.is_bye());
      assert!(m.team1.is_none() && m.team2.is_none());
    }
    let played = get(&bracket, "U-R1-M2");
    assert_eq!(seed_of(played.team1.as_ref()), Some(4));
    assert_eq!(seed_of(played.team2.as_ref()), Some(5));

    let semi_one = get(&bracket, "U-R2-M1");
    assert_eq!(seed_of(semi_one.team1.as_ref()), Some(1));
    assert!(semi_one.team2.is_none());
    let semi_two = get(&bracket, "U-R2-M2");
    assert_eq!(seed_of(semi_two.team1.as_ref()), Some(2));
    assert_eq!(seed_of(semi_two.team2.as_ref()), Some(3));
  }

  #[test]
  fn test_walkover_past_bye_cap() {
    let bracket = build_bracket(&teams(9), Division::Upper, &BracketOptions::default()).unwrap();
    let byes = bracket.iter().filter(|m| m.is_bye()).count();
    assert_eq!(byes, 5);
    let walkovers = bracket.iter().filter(|m| m.is_walkover()).collect::<Vec<_>>();
    assert_eq!(walkovers.len(), 2);
    for m in walkovers {
      let lone = m.team1.as_ref().or(m.team2.as_ref()).unwrap();
      assert!(lone.seed == 6 || lone.seed == 7);
      let (parent, side) = m.winner_target().unwrap();
      assert_eq!(get(&bracket, parent).team(side).map(|t| t.seed), Some(lone.seed));
    }
  }

  #[test]
  fn test_winner_propagates_to_parent_slot() {
    let bracket = build_bracket(&teams(8), Division::Upper, &BracketOptions::default()).unwrap();
    let scored = record_bracket_score(&bracket, "U-R1-M1", "25-21").unwrap();
    let m = get(&scored, "U-R1-M1");
    assert_eq!(m.score.as_deref(), Some("25-21"));
    assert_eq!(seed_of(get(&scored, "U-R2-M1").team1.as_ref()), Some(1));
    // Input list is untouched.
    assert!(get(&bracket, "U-R2-M1").team1.is_none());
  }

  #[test]
  fn test_team2_win_and_side_two_target() {
    let bracket = build_bracket(&teams(8), Division::Upper, &BracketOptions::default()).unwrap();
    let scored = record_bracket_score(&bracket, "U-R1-M2", "18 \u{2013} 21").unwrap();
    assert_eq!(seed_of(get(&scored, "U-R2-M1").team2.as_ref()), Some(5));
  }

  #[test]
  fn test_score_entry_rejections() {
    let bracket = build_bracket(&teams(5), Division::Upper, &BracketOptions::default()).unwrap();
    assert!(matches!(
      record_bracket_score(&bracket, "nope", "21-10"),
      Err(TournamentError::MatchNotFound(_))
    ));
    assert!(matches!(
      record_bracket_score(&bracket, "U-R1-M1", "21-10"),
      Err(TournamentError::MatchNotReady(_))
    ));
    assert!(matches!(
      record_bracket_score(&bracket, "U-R2-M1", "21-10"),
      Err(TournamentError::MatchNotReady(_))
    ));
    assert!(matches!(
      record_bracket_score(&bracket, "U-R1-M2", "21-21"),
      Err(TournamentError::UnparseableScore(_))
    ));
  }

  #[test]
  fn test_rescoring_retracts_downstream_results() {
    let bracket = build_bracket(&teams(4), Division::Upper, &BracketOptions::default()).unwrap();
    let bracket = record_bracket_score(&bracket, "U-R1-M1", "21-10").unwrap();
    let bracket = record_bracket_score(&bracket, "U-R1-M2", "21-10").unwrap();
    let bracket = record_bracket_score(&bracket, "U-R2-M1", "21-15").unwrap();
    assert_eq!(bracket_champion(&bracket, Division::Upper).map(|t| t.seed), Some(1));

    let flipped = record_bracket_score(&bracket, "U-R1-M1", "10-21").unwrap();
    let final_match = get(&flipped, "U-R2-M1");
    assert_eq!(seed_of(final_match.team1.as_ref()), Some(4));
    assert!(final_match.score.is_none());
    assert!(bracket_champion(&flipped, Division::Upper).is_none());

    let cleared = record_bracket_score(&bracket, "U-R1-M2", "").unwrap();
    assert!(get(&cleared, "U-R1-M2").score.is_none());
    assert!(get(&cleared, "U-R2-M1").team2.is_none());
    assert!(get(&cleared, "U-R2-M1").score.is_none());
  }

  #[test]
  fn test_same_winner_rescore_keeps_downstream() {
    let bracket = build_bracket(&teams(4), Division::Upper, &BracketOptions::default()).unwrap();
    let bracket = record_bracket_score(&bracket, "U-R1-M1", "21-10").unwrap();
    let bracket = record_bracket_score(&bracket, "U-R1-M2", "21-10").unwrap();
    let bracket = record_bracket_score(&bracket, "U-R2-M1", "21-15").unwrap();
    let rescored = record_bracket_score(&bracket, "U-R1-M1", "23-21").unwrap();
    assert_eq!(get(&rescored, "U-R2-M1").score.as_deref(), Some("21-15"));
  }

  #[test]
  fn test_third_place_receives_semifinal_losers() {
    let options = BracketOptions {
      third_place: true,
      ..BracketOptions::default()
    };
    let bracket = build_bracket(&teams(4), Division::Upper, &options).unwrap();
    assert_eq!(bracket.len(), 4);
    let bracket = record_bracket_score(&bracket, "U-R1-M1", "21-10").unwrap();
    let bracket = record_bracket_score(&bracket, "U-R1-M2", "12-21").unwrap();
    let consolation = get(&bracket, "U-R2-M2");
    assert_eq!(seed_of(consolation.team1.as_ref()), Some(4));
    assert_eq!(seed_of(consolation.team2.as_ref()), Some(2));
    assert_eq!(get(&bracket, "U-R1-M1").loser_target(), Some(("U-R2-M2", Side::Team1)));
  }

  #[test]
  fn test_too_few_teams_rejected() {
    assert!(matches!(
      build_bracket(&teams(1), Division::Upper, &BracketOptions::default()),
      Err(TournamentError::NotEnoughTeams { count: 1, .. })
    ));
    let empty_courts = BracketOptions {
      courts: Vec::new(),
      ..BracketOptions::default()
    };
    assert!(matches!(
      build_bracket(&teams(2), Division::Upper, &empty_courts),
      Err(TournamentError::InvalidOption(_))
    ));
  }

  #[test]
  fn test_bracket_serializes_with_camel_case_pointers() {
    let bracket = build_bracket(&teams(2), Division::Upper, &BracketOptions::default()).unwrap();
    let scored = record_bracket_score(&bracket, "U-R1-M1", "21-19").unwrap();
    let json = serde_json::to_value(&scored).unwrap();
    assert_eq!(json[0]["score"], "21-19");
    assert_eq!(json[0]["team1"]["displayName"], "Guy1 & Girl1");
    assert!(json[0].get("winnerTargetMatchId").is_none());
    assert_eq!(bracket_champion(&scored, Division::Upper).map(|t| t.seed), Some(1));
  }
}
