//! Error types for the tournament core

use thiserror::Error;

use crate::types::Division;

/// Result type for tournament operations
pub type Result<T> = std::result::Result<T, TournamentError>;

#[derive(Error, Debug)]
pub enum TournamentError {
    /// An option passed by the host is out of range
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// A bracket needs at least two teams
    #[error("Not enough teams for the {division} bracket: {count}")]
    NotEnoughTeams { division: Division, count: usize },

    /// Scored match participants found in neither roster
    #[error("Players not on either roster: {}", .0.join(", "))]
    UnresolvedParticipants(Vec<String>),

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    /// Match is a bye or is still waiting on a team
    #[error("Match is not ready for a score: {0}")]
    MatchNotReady(String),

    #[error("Score must look like \"21-15\" with a winner: {0:?}")]
    UnparseableScore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
