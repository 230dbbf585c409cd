pub mod bracket;
pub mod config;
pub mod error;
pub mod logging;
pub mod playoffs;
pub mod redemption;
pub mod rng;
pub mod roster;
pub mod rounds;
pub mod score;
pub mod standings;
pub mod state;
pub mod types;

// ── Public surface ─────────────────────────────────────────────────────
//
// The four host-facing operations plus bracket score entry. Each is a
// pure function of its arguments; randomness only enters through the
// explicit `seed` options.

pub use bracket::{bracket_champion, build_bracket, record_bracket_score, BracketOptions};
pub use config::{load_config, TournamentConfig};
pub use error::{Result, TournamentError};
pub use logging::init_logging;
pub use playoffs::{build_playoff_brackets, PlayoffOptions};
pub use redemption::{build_redemption_rally, RedemptionOptions};
pub use roster::{parse_roster_text, Membership, RosterIndex};
pub use rounds::{generate_rounds, RoundOptions};
pub use score::{is_valid_pool_score, parse_score, pool_score_status, ScoreStatus};
pub use standings::{compute_standings, compute_standings_with, Tiebreaks};
pub use state::TournamentState;
pub use types::*;
