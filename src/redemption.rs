use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::bracket::{build_bracket, decided, BracketOptions};
use crate::error::Result;
use crate::rng::Lcg;
use crate::types::{BracketMatch, Division, PlayoffTeam, DEFAULT_LOWER_COURTS};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedemptionOptions {
  pub randomize_partners: bool,
  pub seed: Option<u32>,
  pub courts: Vec<u32>,
}

impl Default for RedemptionOptions {
  fn default() -> Self {
    RedemptionOptions {
      randomize_partners: true,
      seed: None,
      courts: DEFAULT_LOWER_COURTS.to_vec(),
    }
  }
}

/// Losing teams of decided round 1 and round 2 matches in the Upper and
/// Lower brackets, ordered by division, round, then slot. Matches fed by
/// loser pointers (the third-place match) hold teams already harvested.
pub fn harvest_losers(main: &[BracketMatch]) -> Vec<PlayoffTeam> {
  let loser_fed = main
    .iter()
    .filter_map(|m| m.loser_target().map(|(id, _)| id))
    .collect::<HashSet<_>>();
  let mut eligible = main
    .iter()
    .filter(|m| matches!(m.division, Division::Upper | Division::Lower))
    .filter(|m| m.round == 1 || m.round == 2)
    .filter(|m| !loser_fed.contains(m.id.as_str()))
    .collect::<Vec<_>>();
  eligible.sort_by_key(|m| (m.division != Division::Upper, m.round, m.slot));
  eligible
    .into_iter()
    .filter_map(|m| decided(m).map(|(_, loser)| loser.clone()))
    .collect()
}

/// Re-pairs harvested teams. Guys and girls are shuffled separately so
/// every new team is still one guy and one girl.
fn repartner(losers: &[PlayoffTeam], rng: &mut Lcg) -> Vec<(String, String)> {
  let mut guys = losers.iter().map(|t| t.members[0].clone()).collect::<Vec<_>>();
  let mut girls = losers.iter().map(|t| t.members[1].clone()).collect::<Vec<_>>();
  rng.shuffle(&mut guys);
  rng.shuffle(&mut girls);
  guys.into_iter().zip(girls).collect()
}

pub fn build_redemption_rally(main: &[BracketMatch], options: &RedemptionOptions) -> Result<Vec<BracketMatch>> {
  let losers = harvest_losers(main);
  let pairs = if options.randomize_partners {
    let mut rng = Lcg::from_optional(options.seed);
    repartner(&losers, &mut rng)
  } else {
    losers
      .iter()
      .map(|t| (t.members[0].clone(), t.members[1].clone()))
      .collect()
  };

  let teams = pairs
    .into_iter()
    .enumerate()
    .map(|(idx, (guy, girl))| {
      let mut team = PlayoffTeam::new(format!("R-T{}", idx + 1), guy, girl, Division::Redemption);
      team.seed = idx as u32 + 1;
      team
    })
    .collect::<Vec<_>>();
  tracing::info!(teams = teams.len(), randomized = options.randomize_partners, "building Redemption Rally");

  build_bracket(
    &teams,
    Division::Redemption,
    &BracketOptions {
      requested_byes: 0,
      courts: options.courts.clone(),
      third_place: false,
    },
  )
}
