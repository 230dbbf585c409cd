use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::bracket::record_bracket_score;
use crate::error::{Result, TournamentError};
use crate::playoffs::{build_playoff_brackets, PlayoffOptions};
use crate::redemption::{build_redemption_rally, RedemptionOptions};
use crate::roster::{parse_roster_text, RosterIndex};
use crate::rounds::{generate_rounds, RoundOptions};
use crate::standings::{compute_standings_with, Tiebreaks};
use crate::types::{BracketMatch, Division, PoolMatch, StandbyEntry, Standings};

/// The persisted tournament document. Every transition returns a new
/// value; nothing is edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TournamentState {
    pub guys_text: String,
    pub girls_text: String,
    pub matches: Vec<PoolMatch>,
    pub brackets: Vec<BracketMatch>,
}

impl TournamentState {
    pub fn new(guys_text: impl Into<String>, girls_text: impl Into<String>) -> Self {
        TournamentState {
            guys_text: guys_text.into(),
            girls_text: girls_text.into(),
            ..TournamentState::default()
        }
    }

    pub fn guys_roster(&self) -> Vec<String> {
        parse_roster_text(&self.guys_text)
    }

    pub fn girls_roster(&self) -> Vec<String> {
        parse_roster_text(&self.girls_text)
    }

    pub fn roster_index(&self) -> RosterIndex {
        RosterIndex::new(&self.guys_roster(), &self.girls_roster())
    }

    /// Appends the generated rounds and reports who sat out.
    pub fn with_generated_rounds(&self, options: &RoundOptions) -> Result<(Self, Vec<StandbyEntry>)> {
        let generated = generate_rounds(&self.guys_roster(), &self.girls_roster(), &self.matches, options)?;
        let mut next = self.clone();
        next.matches.extend(generated.matches);
        Ok((next, generated.standby))
    }

    pub fn with_pool_score(&self, round: u32, court: u32, text: &str) -> Result<Self> {
        let mut next = self.clone();
        let pool_match = next
            .matches
            .iter_mut()
            .find(|m| m.round == round && m.court == court)
            .ok_or_else(|| TournamentError::MatchNotFound(format!("round {round} court {court}")))?;
        pool_match.score_text = text.trim().to_string();
        Ok(next)
    }

    pub fn standings(&self, tiebreaks: &Tiebreaks) -> Result<Standings> {
        compute_standings_with(&self.roster_index(), &self.matches, tiebreaks)
    }

    /// Replaces every bracket, Redemption Rally included.
    pub fn with_playoff_brackets(&self, tiebreaks: &Tiebreaks, options: &PlayoffOptions) -> Result<Self> {
        let standings = self.standings(tiebreaks)?;
        let brackets = build_playoff_brackets(&standings, options)?;
        Ok(TournamentState {
            brackets,
            ..self.clone()
        })
    }

    pub fn with_bracket_score(&self, match_id: &str, text: &str) -> Result<Self> {
        let brackets = record_bracket_score(&self.brackets, match_id, text)?;
        Ok(TournamentState {
            brackets,
            ..self.clone()
        })
    }

    /// Rebuilds the Redemption Rally from the current main brackets.
    pub fn with_redemption_rally(&self, options: &RedemptionOptions) -> Result<Self> {
        let mut brackets = self
            .brackets
            .iter()
            .filter(|m| m.division != Division::Redemption)
            .cloned()
            .collect::<Vec<_>>();
        let rally = build_redemption_rally(&brackets, options)?;
        brackets.extend(rally);
        Ok(TournamentState {
            brackets,
            ..self.clone()
        })
    }

    pub fn division_matches(&self, division: Division) -> impl Iterator<Item = &BracketMatch> {
        self.brackets.iter().filter(move |m| m.division == division)
    }

    /// Missing file loads as an empty tournament.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(TournamentState::default());
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)?;
        Ok(())
    }
}
