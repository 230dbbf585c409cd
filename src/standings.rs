use std::{
  cmp::Ordering,
  collections::{HashMap, HashSet},
};

use crate::error::{Result, TournamentError};
use crate::roster::{slug, Membership, RosterIndex};
use crate::score::valid_pool_score;
use crate::types::{Gender, PlayerRecord, PoolMatch, Standings};

/// Manual tiebreak values keyed by player slug. Lower ranks first.
#[derive(Clone, Debug, Default)]
pub struct Tiebreaks {
  values: HashMap<String, i32>,
}

impl Tiebreaks {
  pub fn new() -> Self {
    Tiebreaks::default()
  }

  pub fn set(&mut self, name: &str, value: i32) {
    self.values.insert(slug(name), value);
  }

  pub fn get(&self, name: &str) -> Option<i32> {
    self.values.get(&slug(name)).copied()
  }
}

pub fn compute_standings(matches: &[PoolMatch], guys: &[String], girls: &[String]) -> Result<Standings> {
  let index = RosterIndex::new(guys, girls);
  compute_standings_with(&index, matches, &Tiebreaks::default())
}

/// Fails with `UnresolvedParticipants` when a scored match names a player
/// the index cannot place; resolve them with `RosterIndex::assign`.
pub fn compute_standings_with(
  index: &RosterIndex,
  matches: &[PoolMatch],
  tiebreaks: &Tiebreaks,
) -> Result<Standings> {
  let unresolved = unresolved_participants(index, matches);
  if !unresolved.is_empty() {
    return Err(TournamentError::UnresolvedParticipants(unresolved));
  }

  let mut records: HashMap<String, PlayerRecord> = HashMap::new();
  for gender in [Gender::Guy, Gender::Girl] {
    for name in index.ranked_names(gender) {
      records
        .entry(slug(name))
        .or_insert_with(|| PlayerRecord::new(name.clone()));
    }
  }

  let mut counted = 0usize;
  for pool_match in matches {
    let Some((a, b)) = valid_pool_score(&pool_match.score_text) else {
      continue;
    };
    let diff = i64::from(a.abs_diff(b));
    let (winners, losers) = if a > b {
      (&pool_match.team_a, &pool_match.team_b)
    } else {
      (&pool_match.team_b, &pool_match.team_a)
    };
    for name in winners {
      if let Some(record) = records.get_mut(&slug(name)) {
        record.wins += 1;
        record.point_diff = record.point_diff.saturating_add(diff);
      }
    }
    for name in losers {
      if let Some(record) = records.get_mut(&slug(name)) {
        record.losses += 1;
        record.point_diff = record.point_diff.saturating_sub(diff);
      }
    }
    counted += 1;
  }
  tracing::debug!(counted, total = matches.len(), "tallied pool matches");

  let mut ranked = |gender: Gender| -> Vec<PlayerRecord> {
    let mut list = index
      .ranked_names(gender)
      .filter_map(|name| records.remove(&slug(name)))
      .map(|mut record| {
        record.tiebreak = tiebreaks.get(&record.name);
        record
      })
      .collect::<Vec<_>>();
    list.sort_by(rank_order);
    list
  };
  let guys = ranked(Gender::Guy);
  let girls = ranked(Gender::Girl);
  Ok(Standings { guys, girls })
}

/// Wins, then point differential, then manual tiebreak (players without
/// one after those with one), then name.
pub fn rank_order(a: &PlayerRecord, b: &PlayerRecord) -> Ordering {
  b.wins
    .cmp(&a.wins)
    .then_with(|| b.point_diff.cmp(&a.point_diff))
    .then_with(|| match (a.tiebreak, b.tiebreak) {
      (Some(x), Some(y)) => x.cmp(&y),
      (Some(_), None) => Ordering::Less,
      (None, Some(_)) => Ordering::Greater,
      (None, None) => Ordering::Equal,
    })
    .then_with(|| slug(&a.name).cmp(&slug(&b.name)))
    .then_with(|| a.name.cmp(&b.name))
}

/// Names in scored matches that belong to neither roster, in order of
/// first appearance.
pub fn unresolved_participants(index: &RosterIndex, matches: &[PoolMatch]) -> Vec<String> {
  let mut seen = HashSet::new();
  let mut out = Vec::new();
  for pool_match in matches {
    if valid_pool_score(&pool_match.score_text).is_none() {
      continue;
    }
    for name in pool_match.players() {
      if index.membership(name) != Membership::Unknown {
        continue;
      }
      if seen.insert(slug(name)) {
        out.push(name.trim().to_string());
      }
    }
  }
  out
}
