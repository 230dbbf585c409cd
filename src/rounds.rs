use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{Result, TournamentError};
use crate::rng::{os_seed, Lcg};
use crate::roster::{dedupe_names, slug};
use crate::types::{Gender, GeneratedRounds, MatchTag, PoolMatch, StandbyEntry, GIRLS_SEED_OFFSET};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoundOptions {
  pub strict: bool,
  pub seed: Option<u32>,
  pub round_count: u32,
  pub start_court: u32,
}

impl Default for RoundOptions {
  fn default() -> Self {
    RoundOptions {
      strict: true,
      seed: None,
      round_count: 1,
      start_court: 1,
    }
  }
}

/// Symmetric "has ever been paired with" relation, keyed by slug.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairHistory {
  links: HashMap<String, HashSet<String>>,
}

impl PairHistory {
  pub fn contains(&self, a: &str, b: &str) -> bool {
    self
      .links
      .get(&slug(a))
      .map(|set| set.contains(&slug(b)))
      .unwrap_or(false)
  }

  pub fn with_pair(mut self, a: &str, b: &str) -> Self {
    let (a, b) = (slug(a), slug(b));
    self.links.entry(a.clone()).or_default().insert(b.clone());
    self.links.entry(b).or_default().insert(a);
    self
  }

  /// Partners: the two members of each team.
  pub fn partners_from(history: &[PoolMatch]) -> Self {
    history
      .iter()
      .fold(PairHistory::default(), |acc, m| acc.with_partners(m))
  }

  fn with_partners(self, m: &PoolMatch) -> Self {
    self
      .with_pair(&m.team_a[0], &m.team_a[1])
      .with_pair(&m.team_b[0], &m.team_b[1])
  }

  /// Opponents: every cross pair between the two teams of each match.
  pub fn opponents_from(history: &[PoolMatch]) -> Self {
    history
      .iter()
      .fold(PairHistory::default(), |acc, m| acc.with_opponents(&m.team_a, &m.team_b))
  }

  fn with_opponents(self, a: &[String; 2], b: &[String; 2]) -> Self {
    let mut next = self;
    for x in a {
      for y in b {
        next = next.with_pair(x, y);
      }
    }
    next
  }

  fn any_between(&self, a: &[String; 2], b: &[String; 2]) -> bool {
    a.iter().any(|x| b.iter().any(|y| self.contains(x, y)))
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct DrawTeam {
  members: [String; 2],
  tag: MatchTag,
}

impl DrawTeam {
  fn new(first: &str, second: &str, tag: MatchTag) -> Self {
    DrawTeam {
      members: [first.to_string(), second.to_string()],
      tag,
    }
  }
}

struct CourtAssignment {
  matches: Vec<PoolMatch>,
  unplaced: Option<DrawTeam>,
  opponents: PairHistory,
}

/// One drawn round plus the partner and opponent history after it.
struct RoundDraw {
  matches: Vec<PoolMatch>,
  standby: Vec<StandbyEntry>,
  partners: PairHistory,
  opponents: PairHistory,
}

/// Builds `round_count` rounds in sequence; each round treats the rounds
/// before it in the batch as history.
pub fn generate_rounds(
  guys: &[String],
  girls: &[String],
  history: &[PoolMatch],
  options: &RoundOptions,
) -> Result<GeneratedRounds> {
  if options.round_count == 0 {
    return Err(TournamentError::InvalidOption("round count must be at least 1".to_string()));
  }
  let guys = dedupe_names(guys);
  let girls = dedupe_names(girls);
  let base_seed = options.seed.unwrap_or_else(os_seed);
  let first_round = history.iter().map(|m| m.round).max().unwrap_or(0) + 1;

  let mut partners = PairHistory::partners_from(history);
  let mut opponents = PairHistory::opponents_from(history);
  let mut generated = GeneratedRounds::default();
  for offset in 0..options.round_count {
    let round = first_round + offset;
    let seed = base_seed.wrapping_add(offset);
    let draw = generate_round(&guys, &girls, partners, opponents, options, seed, round);
    partners = draw.partners;
    opponents = draw.opponents;
    generated.matches.extend(draw.matches);
    generated.standby.extend(draw.standby);
  }
  tracing::info!(
    rounds = options.round_count,
    first_round,
    matches = generated.matches.len(),
    standby = generated.standby.len(),
    "generated pool rounds"
  );
  Ok(generated)
}

fn generate_round(
  guys: &[String],
  girls: &[String],
  partners: PairHistory,
  opponents: PairHistory,
  options: &RoundOptions,
  seed: u32,
  round: u32,
) -> RoundDraw {
  let mut guys = guys.to_vec();
  let mut girls = girls.to_vec();
  Lcg::new(seed).shuffle(&mut guys);
  Lcg::new(seed.wrapping_add(GIRLS_SEED_OFFSET)).shuffle(&mut girls);

  let (mut teams, girls) = pair_mixed(&guys, girls, options.strict, &partners);
  let paired = teams.len();
  let (extra_teams, unplaced_guys, unplaced_girls) = pair_leftovers(&guys[paired..], &girls[paired..]);
  teams.extend(extra_teams);

  let assignment = assign_courts(teams, options.strict, opponents, round, options.start_court);

  let mut standby = Vec::new();
  let mut bench = |name: &str, gender: Gender| {
    tracing::warn!(round, name, %gender, "player on standby this round");
    standby.push(StandbyEntry {
      round,
      name: name.to_string(),
      gender,
    });
  };
  for name in &unplaced_guys {
    bench(name, Gender::Guy);
  }
  for name in &unplaced_girls {
    bench(name, Gender::Girl);
  }
  if let Some(team) = assignment.unplaced {
    let genders = match team.tag {
      MatchTag::Mixed => [Gender::Guy, Gender::Girl],
      MatchTag::SameGenderGuys => [Gender::Guy, Gender::Guy],
      MatchTag::SameGenderGirls => [Gender::Girl, Gender::Girl],
    };
    for (name, gender) in team.members.iter().zip(genders) {
      bench(name, gender);
    }
  }
  tracing::debug!(round, matches = assignment.matches.len(), seed, "built round");
  // A team left without an opponent never played together.
  let partners = assignment
    .matches
    .iter()
    .fold(partners, |acc, m| acc.with_partners(m));
  RoundDraw {
    matches: assignment.matches,
    standby,
    partners,
    opponents: assignment.opponents,
  }
}

/// Pairs `guys[i]` with `girls[i]`. In strict mode a repeat partner is
/// swapped for the first later girl the guy has not partnered; with none
/// left the repeat stands. Returns the teams and the girls in their final
/// order.
fn pair_mixed(
  guys: &[String],
  mut girls: Vec<String>,
  strict: bool,
  partners: &PairHistory,
) -> (Vec<DrawTeam>, Vec<String>) {
  let mut teams = Vec::new();
  for i in 0..guys.len().min(girls.len()) {
    let guy = &guys[i];
    if strict && partners.contains(guy, &girls[i]) {
      if let Some(j) = (i + 1..girls.len()).find(|&j| !partners.contains(guy, &girls[j])) {
        girls.swap(i, j);
      }
    }
    teams.push(DrawTeam::new(guy, &girls[i], MatchTag::Mixed));
  }
  (teams, girls)
}

/// First two leftovers of each gender form a same-gender team; the rest
/// are returned unplaced.
fn pair_leftovers(guys: &[String], girls: &[String]) -> (Vec<DrawTeam>, Vec<String>, Vec<String>) {
  let mut teams = Vec::new();
  let mut split = |names: &[String], tag: MatchTag| -> Vec<String> {
    if names.len() >= 2 {
      teams.push(DrawTeam::new(&names[0], &names[1], tag));
      names[2..].to_vec()
    } else {
      names.to_vec()
    }
  };
  let unplaced_guys = split(guys, MatchTag::SameGenderGuys);
  let unplaced_girls = split(girls, MatchTag::SameGenderGirls);
  (teams, unplaced_guys, unplaced_girls)
}

/// Two teams per court. In strict mode the first team faces the first
/// later team with no opponent history against it, else the next team.
fn assign_courts(
  teams: Vec<DrawTeam>,
  strict: bool,
  opponents: PairHistory,
  round: u32,
  start_court: u32,
) -> CourtAssignment {
  let mut remaining = teams;
  let mut opponents = opponents;
  let mut matches = Vec::new();
  let mut court = start_court;
  while remaining.len() >= 2 {
    let team_a = remaining.remove(0);
    let pick = if strict {
      remaining
        .iter()
        .position(|b| !opponents.any_between(&team_a.members, &b.members))
        .unwrap_or(0)
    } else {
      0
    };
    let team_b = remaining.remove(pick);
    opponents = opponents.with_opponents(&team_a.members, &team_b.members);
    let tag = [team_a.tag, team_b.tag]
      .into_iter()
      .find(|tag| *tag != MatchTag::Mixed)
      .unwrap_or(MatchTag::Mixed);
    matches.push(PoolMatch {
      round,
      court,
      team_a: team_a.members,
      team_b: team_b.members,
      tag,
      score_text: String::new(),
    });
    court += 1;
  }
  CourtAssignment {
    matches,
    unplaced: remaining.pop(),
    opponents,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
  }

  fn roster(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{prefix}{i}")).collect()
  }

  fn seeded(seed: u32) -> RoundOptions {
    RoundOptions {
      strict: true,
      seed: Some(seed),
      round_count: 1,
      start_court: 1,
    }
  }

  fn pool(round: u32, a: [&str; 2], b: [&str; 2]) -> PoolMatch {
    PoolMatch {
      round,
      court: 1,
      team_a: [a[0].to_string(), a[1].to_string()],
      team_b: [b[0].to_string(), b[1].to_string()],
      tag: MatchTag::Mixed,
      score_text: String::new(),
    }
  }

  fn team_sets(matches: &[PoolMatch]) -> Vec<HashSet<String>> {
    matches
      .iter()
      .flat_map(|m| [&m.team_a, &m.team_b])
      .map(|team| team.iter().map(|n| slug(n)).collect())
      .collect()
  }

  #[test]
  fn test_seeded_generation_is_reproducible() {
    let guys = roster("G", 8);
    let girls = roster("H", 8);
    let first = generate_rounds(&guys, &girls, &[], &seeded(42)).unwrap();
    let second = generate_rounds(&guys, &girls, &[], &seeded(42)).unwrap();
    assert_eq!(first, second);
    assert_eq!(
      serde_json::to_string(&first).unwrap(),
      serde_json::to_string(&second).unwrap()
    );
  }

  #[test]
  fn test_round_and_court_numbering() {
    let guys = roster("G", 4);
    let girls = roster("H", 4);
    let history = vec![pool(3, ["X", "Y"], ["Z", "W"])];
    let options = RoundOptions {
      start_court: 5,
      round_count: 2,
      ..seeded(1)
    };
    let generated = generate_rounds(&guys, &girls, &history, &options).unwrap();
    let layout = generated.matches.iter().map(|m| (m.round, m.court)).collect::<Vec<_>>();
    assert_eq!(layout, vec![(4, 5), (4, 6), (5, 5), (5, 6)]);
  }

  #[test]
  fn test_every_team_is_mixed_with_even_rosters() {
    let generated = generate_rounds(&roster("G", 6), &roster("H", 6), &[], &seeded(9)).unwrap();
    assert_eq!(generated.matches.len(), 3);
    assert!(generated.standby.is_empty());
    for m in &generated.matches {
      assert_eq!(m.tag, MatchTag::Mixed);
      for team in [&m.team_a, &m.team_b] {
        assert!(team[0].starts_with('G'));
        assert!(team[1].starts_with('H'));
      }
    }
  }

  #[test]
  fn test_strict_avoids_repeat_partners_when_possible() {
    let guys = names(&["Al", "Bo"]);
    let girls = names(&["Cy", "Di"]);
    let history = vec![pool(1, ["Al", "Cy"], ["Bo", "Di"])];
    for seed in 0..20 {
      let generated = generate_rounds(&guys, &girls, &history, &seeded(seed)).unwrap();
      let teams = team_sets(&generated.matches);
      assert_eq!(teams.len(), 2);
      for team in teams {
        assert!(!(team.contains("al") && team.contains("cy")));
        assert!(!(team.contains("bo") && team.contains("di")));
      }
    }
  }

  #[test]
  fn test_strict_falls_back_to_repeat_when_exhausted() {
    let guys = names(&["Al", "Bo"]);
    let girls = names(&["Cy", "Di"]);
    let history = vec![
      pool(1, ["Al", "Cy"], ["Bo", "Di"]),
      pool(2, ["Al", "Di"], ["Bo", "Cy"]),
    ];
    let generated = generate_rounds(&guys, &girls, &history, &seeded(42)).unwrap();
    assert_eq!(generated.matches.len(), 1);
    assert_eq!(generated.matches[0].round, 3);
    assert!(generated.standby.is_empty());
  }

  #[test]
  fn test_round_draw_carries_history_forward() {
    let guys = roster("G", 5);
    let girls = roster("H", 6);
    let history = vec![pool(1, ["G1", "H1"], ["G2", "H2"])];
    let draw = generate_round(
      &guys,
      &girls,
      PairHistory::partners_from(&history),
      PairHistory::opponents_from(&history),
      &seeded(8),
      2,
      2,
    );
    // 5 mixed teams: two matches and one team without an opponent
    assert_eq!(draw.matches.len(), 2);
    assert_eq!(draw.standby.len(), 3);
    let mut all = history.clone();
    all.extend(draw.matches.iter().cloned());
    assert_eq!(draw.partners, PairHistory::partners_from(&all));
    assert_eq!(draw.opponents, PairHistory::opponents_from(&all));
  }

  #[test]
  fn test_pair_mixed_swaps_to_first_fresh_partner() {
    let partners = PairHistory::default().with_pair("Al", "Cy");
    let (teams, girls) = pair_mixed(&names(&["Al", "Bo"]), names(&["Cy", "Di"]), true, &partners);
    assert_eq!(teams[0].members, ["Al".to_string(), "Di".to_string()]);
    assert_eq!(teams[1].members, ["Bo".to_string(), "Cy".to_string()]);
    assert_eq!(girls, names(&["Di", "Cy"]));
  }

  #[test]
  fn test_pair_mixed_lenient_keeps_repeat() {
    let partners = PairHistory::default().with_pair("Al", "Cy");
    let (teams, _) = pair_mixed(&names(&["Al"]), names(&["Cy", "Di"]), false, &partners);
    assert_eq!(teams[0].members, ["Al".to_string(), "Cy".to_string()]);
  }

  #[test]
  fn test_assign_courts_avoids_previous_opponents() {
    let teams = vec![
      DrawTeam::new("A1", "A2", MatchTag::Mixed),
      DrawTeam::new("B1", "B2", MatchTag::Mixed),
      DrawTeam::new("C1", "C2", MatchTag::Mixed),
      DrawTeam::new("D1", "D2", MatchTag::Mixed),
    ];
    let opponents = PairHistory::default().with_pair("A2", "B1");
    let assignment = assign_courts(teams, true, opponents, 1, 1);
    assert_eq!(assignment.matches[0].team_b[0], "C1");
    assert_eq!(assignment.matches[1].team_a[0], "B1");
    assert_eq!(assignment.matches[1].team_b[0], "D1");
    assert!(assignment.opponents.contains("a1", "c2"));
    assert!(assignment.unplaced.is_none());
  }

  #[test]
  fn test_two_leftover_guys_form_tagged_team() {
    let generated = generate_rounds(&roster("G", 7), &roster("H", 5), &[], &seeded(3)).unwrap();
    assert_eq!(generated.matches.len(), 3);
    assert!(generated.standby.is_empty());
    let tagged = generated
      .matches
      .iter()
      .filter(|m| m.tag == MatchTag::SameGenderGuys)
      .count();
    assert_eq!(tagged, 1);
  }

  #[test]
  fn test_two_leftover_girls_form_tagged_team() {
    let generated = generate_rounds(&roster("G", 3), &roster("H", 5), &[], &seeded(3)).unwrap();
    assert_eq!(generated.matches.len(), 2);
    assert!(generated.matches.iter().any(|m| m.tag == MatchTag::SameGenderGirls));
  }

  #[test]
  fn test_single_leftover_guy_goes_to_standby() {
    let generated = generate_rounds(&roster("G", 5), &roster("H", 4), &[], &seeded(11)).unwrap();
    assert_eq!(generated.matches.len(), 2);
    assert!(generated.matches.iter().all(|m| m.tag == MatchTag::Mixed));
    assert_eq!(generated.standby.len(), 1);
    assert_eq!(generated.standby[0].gender, Gender::Guy);
    assert_eq!(generated.standby[0].round, 1);

    let placed = generated.matches.iter().flat_map(|m| m.players()).cloned().collect::<HashSet<_>>();
    assert!(!placed.contains(&generated.standby[0].name));
  }

  #[test]
  fn test_odd_team_members_go_to_standby() {
    let options = RoundOptions {
      strict: false,
      ..seeded(5)
    };
    let generated = generate_rounds(&roster("G", 6), &roster("H", 4), &[], &options).unwrap();
    assert_eq!(generated.matches.len(), 2);
    assert_eq!(generated.standby.len(), 2);
    assert!(generated.standby.iter().all(|s| s.gender == Gender::Guy));
  }

  #[test]
  fn test_extra_leftovers_beyond_two_go_to_standby() {
    let generated = generate_rounds(&roster("G", 6), &roster("H", 2), &[], &seeded(8)).unwrap();
    // 2 mixed + 1 guys team: one team sits out, plus the two extra guys.
    assert_eq!(generated.matches.len(), 1);
    assert_eq!(generated.standby.len(), 4);
  }

  #[test]
  fn test_rounds_in_one_batch_see_each_other() {
    let guys = roster("G", 4);
    let girls = roster("H", 4);
    let options = RoundOptions {
      round_count: 3,
      ..seeded(21)
    };
    let generated = generate_rounds(&guys, &girls, &[], &options).unwrap();
    let mut seen = HashSet::new();
    for m in &generated.matches {
      for team in [&m.team_a, &m.team_b] {
        assert!(seen.insert((team[0].clone(), team[1].clone())), "repeat partner in batch");
      }
    }
  }

  #[test]
  fn test_zero_round_count_rejected() {
    let options = RoundOptions {
      round_count: 0,
      ..seeded(1)
    };
    assert!(matches!(
      generate_rounds(&roster("G", 2), &roster("H", 2), &[], &options),
      Err(TournamentError::InvalidOption(_))
    ));
  }

  #[test]
  fn test_empty_rosters_produce_empty_round() {
    let generated = generate_rounds(&[], &[], &[], &seeded(1)).unwrap();
    assert!(generated.matches.is_empty());
    assert!(generated.standby.is_empty());
  }
}
