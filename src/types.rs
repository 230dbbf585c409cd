use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{Arc, Mutex},
};

use crate::state::TournamentState;

// ── Constants ──────────────────────────────────────────────────────────

pub const MAX_BYES: usize = 5;
pub const BYE_SCORE: &str = "BYE";
pub const WALKOVER_SCORE: &str = "W/O";
pub const GIRLS_SEED_OFFSET: u32 = 17;
pub const DEFAULT_UPPER_COURTS: [u32; 5] = [1, 2, 3, 4, 5];
pub const DEFAULT_LOWER_COURTS: [u32; 5] = [6, 7, 8, 9, 10];

// ── Shared state type aliases ──────────────────────────────────────────

/// One tournament document behind a single writer lock. Hosts serving
/// several sessions apply every mutation through this lock.
pub type SharedTournament = Arc<Mutex<TournamentState>>;

// ── Pool play ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gender {
    Guy,
    Girl,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Guy => write!(f, "guy"),
            Gender::Girl => write!(f, "girl"),
        }
    }
}

/// Marks a match that contains a team built from two leftover players of
/// the same gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchTag {
    #[default]
    Mixed,
    SameGenderGuys,
    SameGenderGirls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMatch {
    pub round: u32,
    pub court: u32,
    pub team_a: [String; 2],
    pub team_b: [String; 2],
    #[serde(default)]
    pub tag: MatchTag,
    #[serde(default)]
    pub score_text: String,
}

impl PoolMatch {
    pub fn players(&self) -> impl Iterator<Item = &String> {
        self.team_a.iter().chain(self.team_b.iter())
    }
}

/// A player who could not be placed on a court in a generated round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandbyEntry {
    pub round: u32,
    pub name: String,
    pub gender: Gender,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRounds {
    pub matches: Vec<PoolMatch>,
    pub standby: Vec<StandbyEntry>,
}

// ── Standings ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub point_diff: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiebreak: Option<i32>,
}

impl PlayerRecord {
    pub fn new(name: impl Into<String>) -> Self {
        PlayerRecord {
            name: name.into(),
            wins: 0,
            losses: 0,
            point_diff: 0,
            tiebreak: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standings {
    pub guys: Vec<PlayerRecord>,
    pub girls: Vec<PlayerRecord>,
}

// ── Playoffs ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Division {
    Upper,
    Lower,
    Redemption,
}

impl Division {
    /// Short prefix used in team and match ids.
    pub fn prefix(self) -> &'static str {
        match self {
            Division::Upper => "U",
            Division::Lower => "L",
            Division::Redemption => "R",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Division::Upper => write!(f, "Upper"),
            Division::Lower => write!(f, "Lower"),
            Division::Redemption => write!(f, "Redemption Rally"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayoffTeam {
    pub id: String,
    pub display_name: String,
    /// Guy first, girl second.
    pub members: [String; 2],
    pub seed: u32,
    pub division: Division,
}

impl PlayoffTeam {
    pub fn new(id: String, guy: String, girl: String, division: Division) -> Self {
        PlayoffTeam {
            id,
            display_name: format!("{guy} & {girl}"),
            members: [guy, girl],
            seed: 0,
            division,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Team1,
    Team2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketMatch {
    pub id: String,
    pub division: Division,
    pub round: u32,
    pub slot: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team1: Option<PlayoffTeam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team2: Option<PlayoffTeam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_target_match_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_target_side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loser_target_match_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loser_target_side: Option<Side>,
}

impl BracketMatch {
    pub fn new(id: String, division: Division, round: u32, slot: u32) -> Self {
        BracketMatch {
            id,
            division,
            round,
            slot,
            team1: None,
            team2: None,
            score: None,
            court: None,
            winner_target_match_id: None,
            winner_target_side: None,
            loser_target_match_id: None,
            loser_target_side: None,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.score.as_deref() == Some(BYE_SCORE)
    }

    pub fn is_walkover(&self) -> bool {
        self.score.as_deref() == Some(WALKOVER_SCORE)
    }

    pub fn team(&self, side: Side) -> Option<&PlayoffTeam> {
        match side {
            Side::Team1 => self.team1.as_ref(),
            Side::Team2 => self.team2.as_ref(),
        }
    }

    pub fn set_team(&mut self, side: Side, team: Option<PlayoffTeam>) {
        match side {
            Side::Team1 => self.team1 = team,
            Side::Team2 => self.team2 = team,
        }
    }

    pub fn has_both_teams(&self) -> bool {
        self.team1.is_some() && self.team2.is_some()
    }

    pub fn winner_target(&self) -> Option<(&str, Side)> {
        Some((self.winner_target_match_id.as_deref()?, self.winner_target_side?))
    }

    pub fn loser_target(&self) -> Option<(&str, Side)> {
        Some((self.loser_target_match_id.as_deref()?, self.loser_target_side?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourtPools {
    pub upper: Vec<u32>,
    pub lower: Vec<u32>,
}

impl Default for CourtPools {
    fn default() -> Self {
        CourtPools {
            upper: DEFAULT_UPPER_COURTS.to_vec(),
            lower: DEFAULT_LOWER_COURTS.to_vec(),
        }
    }
}

impl CourtPools {
    /// Upper has its own pool; Lower and Redemption Rally share the other.
    pub fn for_division(&self, division: Division) -> &[u32] {
        match division {
            Division::Upper => &self.upper,
            Division::Lower | Division::Redemption => &self.lower,
        }
    }
}
