use serde::{Deserialize, Serialize};

use crate::bracket::{build_bracket, BracketOptions};
use crate::error::{Result, TournamentError};
use crate::rng::Lcg;
use crate::types::{BracketMatch, CourtPools, Division, PlayerRecord, PlayoffTeam, Standings};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayoffOptions {
  /// Teams per gender advancing to the Upper division.
  pub upper_size: usize,
  pub window_size: usize,
  pub randomize: bool,
  pub byes_upper: usize,
  pub byes_lower: usize,
  pub seed: Option<u32>,
  pub courts: CourtPools,
  pub third_place: bool,
}

impl Default for PlayoffOptions {
  fn default() -> Self {
    PlayoffOptions {
      upper_size: 8,
      window_size: 2,
      randomize: true,
      byes_upper: 0,
      byes_lower: 0,
      seed: None,
      courts: CourtPools::default(),
      third_place: false,
    }
  }
}

/// Pairs the division's slice of the guys ranking, in order, with the
/// girls slice cut into windows that are optionally shuffled. Teams are
/// then seeded by combined partner record.
pub fn build_playoff_teams(
  standings: &Standings,
  division: Division,
  options: &PlayoffOptions,
  rng: &mut Lcg,
) -> Result<Vec<PlayoffTeam>> {
  if options.window_size < 2 {
    return Err(TournamentError::InvalidOption(format!(
      "window size must be at least 2, got {}",
      options.window_size
    )));
  }
  let guys = division_slice(&standings.guys, division, options.upper_size)?;
  let girls = division_slice(&standings.girls, division, options.upper_size)?;

  let mut arranged: Vec<&PlayerRecord> = Vec::with_capacity(girls.len());
  for window in girls.chunks(options.window_size) {
    let mut window = window.iter().collect::<Vec<_>>();
    if options.randomize {
      rng.shuffle(&mut window);
    }
    arranged.extend(window);
  }

  let unpaired = unpaired_names(guys, &arranged);
  if !unpaired.is_empty() {
    tracing::warn!(%division, unpaired = %unpaired.join(", "), "players without a playoff partner");
  }

  let mut formed = guys
    .iter()
    .zip(arranged)
    .enumerate()
    .map(|(idx, (guy, girl))| {
      let id = format!("{}-T{}", division.prefix(), idx + 1);
      let team = PlayoffTeam::new(id, guy.name.clone(), girl.name.clone(), division);
      let wins = guy.wins + girl.wins;
      let point_diff = guy.point_diff.saturating_add(girl.point_diff);
      (team, wins, point_diff)
    })
    .collect::<Vec<_>>();

  formed.sort_by(|a, b| {
    b.1
      .cmp(&a.1)
      .then_with(|| b.2.cmp(&a.2))
      .then_with(|| a.0.display_name.cmp(&b.0.display_name))
  });
  let teams = formed
    .into_iter()
    .enumerate()
    .map(|(rank, (mut team, _, _))| {
      team.seed = rank as u32 + 1;
      team
    })
    .collect::<Vec<_>>();
  tracing::debug!(%division, teams = teams.len(), "formed playoff teams");
  Ok(teams)
}

/// Players past the shorter of the two gender slices. They sit out the
/// division's bracket.
pub fn unpaired_names(guys: &[PlayerRecord], girls: &[&PlayerRecord]) -> Vec<String> {
  let paired = guys.len().min(girls.len());
  guys[paired..]
    .iter()
    .chain(girls[paired..].iter().copied())
    .map(|record| record.name.clone())
    .collect()
}

fn division_slice(ranking: &[PlayerRecord], division: Division, upper_size: usize) -> Result<&[PlayerRecord]> {
  let cut = upper_size.min(ranking.len());
  match division {
    Division::Upper => Ok(&ranking[..cut]),
    Division::Lower => Ok(&ranking[cut..]),
    Division::Redemption => Err(TournamentError::InvalidOption(
      "Redemption Rally teams come from bracket losers, not standings".to_string(),
    )),
  }
}

/// Upper and Lower brackets in one list. The Upper division must field
/// two teams; a Lower division with fewer is skipped.
pub fn build_playoff_brackets(standings: &Standings, options: &PlayoffOptions) -> Result<Vec<BracketMatch>> {
  let mut rng = Lcg::from_optional(options.seed);
  let upper = build_playoff_teams(standings, Division::Upper, options, &mut rng)?;
  let lower = build_playoff_teams(standings, Division::Lower, options, &mut rng)?;

  let mut matches = build_bracket(
    &upper,
    Division::Upper,
    &BracketOptions {
      requested_byes: options.byes_upper,
      courts: options.courts.upper.clone(),
      third_place: options.third_place,
    },
  )?;
  if lower.len() >= 2 {
    matches.extend(build_bracket(
      &lower,
      Division::Lower,
      &BracketOptions {
        requested_byes: options.byes_lower,
        courts: options.courts.lower.clone(),
        third_place: options.third_place,
      },
    )?);
  } else {
    tracing::warn!(teams = lower.len(), "not enough teams for a Lower bracket; skipping");
  }
  tracing::info!(upper = upper.len(), lower = lower.len(), matches = matches.len(), "built playoff brackets");
  Ok(matches)
}
