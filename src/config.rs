use chrono::Local;
use serde::{Deserialize, Serialize};
use std::{
  collections::HashSet,
  env,
  fs,
  io::Write,
  path::{Path, PathBuf},
};

use crate::error::{Result, TournamentError};
use crate::playoffs::PlayoffOptions;
use crate::redemption::RedemptionOptions;
use crate::rounds::RoundOptions;
use crate::types::{CourtPools, DEFAULT_LOWER_COURTS, DEFAULT_UPPER_COURTS};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TournamentConfig {
  pub upper_courts: Vec<u32>,
  pub lower_courts: Vec<u32>,
  pub start_court: u32,
  pub strict: bool,
  pub upper_size: usize,
  pub window_size: usize,
  pub randomize_windows: bool,
  pub byes_upper: usize,
  pub byes_lower: usize,
  pub randomize_redemption: bool,
  pub logs_dir: String,
}

impl Default for TournamentConfig {
  fn default() -> Self {
    TournamentConfig {
      upper_courts: DEFAULT_UPPER_COURTS.to_vec(),
      lower_courts: DEFAULT_LOWER_COURTS.to_vec(),
      start_court: 1,
      strict: true,
      upper_size: 8,
      window_size: 2,
      randomize_windows: true,
      byes_upper: 0,
      byes_lower: 0,
      randomize_redemption: true,
      logs_dir: "logs".to_string(),
    }
  }
}

impl TournamentConfig {
  pub fn court_pools(&self) -> CourtPools {
    CourtPools {
      upper: self.upper_courts.clone(),
      lower: self.lower_courts.clone(),
    }
  }

  pub fn round_options(&self, round_count: u32, seed: Option<u32>) -> RoundOptions {
    RoundOptions {
      strict: self.strict,
      seed,
      round_count,
      start_court: self.start_court,
    }
  }

  pub fn playoff_options(&self, seed: Option<u32>) -> PlayoffOptions {
    PlayoffOptions {
      upper_size: self.upper_size,
      window_size: self.window_size,
      randomize: self.randomize_windows,
      byes_upper: self.byes_upper,
      byes_lower: self.byes_lower,
      seed,
      courts: self.court_pools(),
      third_place: false,
    }
  }

  pub fn redemption_options(&self, seed: Option<u32>) -> RedemptionOptions {
    RedemptionOptions {
      randomize_partners: self.randomize_redemption,
      seed,
      courts: self.lower_courts.clone(),
    }
  }

  pub fn logs_path(&self) -> PathBuf {
    PathBuf::from(&self.logs_dir)
  }
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn parse_flag(value: &str) -> bool {
  let value = value.trim().to_ascii_lowercase();
  matches!(value.as_str(), "1" | "true" | "yes" | "on")
}

pub fn env_flag_true_default(key: &str, default: bool) -> bool {
  match env::var(key) {
    Ok(value) => parse_flag(&value),
    Err(_) => default,
  }
}

/// "1, 2,3" into court numbers.
pub fn parse_court_list(raw: &str) -> Result<Vec<u32>> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .map(|part| {
      part
        .parse::<u32>()
        .map_err(|e| TournamentError::Config(format!("court {part:?}: {e}")))
    })
    .collect()
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
  T::Err: std::fmt::Display,
{
  match env_default(key) {
    Some(raw) => raw
      .parse::<T>()
      .map(Some)
      .map_err(|e| TournamentError::Config(format!("{key}={raw}: {e}"))),
    None => Ok(None),
  }
}

pub fn apply_env_overrides(mut config: TournamentConfig) -> Result<TournamentConfig> {
  if let Some(raw) = env_default("BLIND_DRAW_UPPER_COURTS") {
    config.upper_courts = parse_court_list(&raw)?;
  }
  if let Some(raw) = env_default("BLIND_DRAW_LOWER_COURTS") {
    config.lower_courts = parse_court_list(&raw)?;
  }
  if let Some(value) = env_number("BLIND_DRAW_START_COURT")? {
    config.start_court = value;
  }
  if let Some(value) = env_number("BLIND_DRAW_UPPER_SIZE")? {
    config.upper_size = value;
  }
  if let Some(value) = env_number("BLIND_DRAW_WINDOW_SIZE")? {
    config.window_size = value;
  }
  config.strict = env_flag_true_default("BLIND_DRAW_STRICT", config.strict);
  if let Some(value) = env_default("BLIND_DRAW_LOGS_DIR") {
    config.logs_dir = value;
  }
  Ok(config)
}

/// Missing file loads the defaults; env overrides apply either way.
pub fn load_config(path: &Path) -> Result<TournamentConfig> {
  if !path.is_file() {
    return apply_env_overrides(TournamentConfig::default());
  }
  let data = fs::read_to_string(path)?;
  let config = serde_json::from_str::<TournamentConfig>(&data)?;
  apply_env_overrides(config)
}

pub fn save_config(path: &Path, config: &TournamentConfig) -> Result<()> {
  let payload = serde_json::to_string_pretty(config)?;
  fs::write(path, payload)?;
  Ok(())
}

pub fn config_warnings(config: &TournamentConfig) -> Vec<String> {
  let mut warnings = Vec::new();
  if config.upper_courts.is_empty() {
    warnings.push("upper court pool is empty; Upper brackets cannot be built".to_string());
  }
  if config.lower_courts.is_empty() {
    warnings.push("lower court pool is empty; Lower and Redemption brackets cannot be built".to_string());
  }
  if config.window_size < 2 {
    warnings.push(format!("window size {} is below 2; playoff teams cannot be formed", config.window_size));
  }
  let upper = config.upper_courts.iter().collect::<HashSet<_>>();
  let shared = config
    .lower_courts
    .iter()
    .filter(|court| upper.contains(court))
    .map(|court| court.to_string())
    .collect::<Vec<_>>();
  if !shared.is_empty() {
    warnings.push(format!("courts {} are in both the upper and lower pools", shared.join(", ")));
  }
  warnings
}

pub fn log_config_warnings(config: &TournamentConfig) {
  for msg in config_warnings(config) {
    tracing::warn!("{}", msg);
  }
}

pub fn tournament_log_path(config: &TournamentConfig) -> PathBuf {
  config.logs_path().join("tournament.log")
}

/// Appends a timestamped entry to the tournament action log. Failures are
/// ignored.
pub fn append_tournament_log(config: &TournamentConfig, label: &str, payload: &str) {
  if fs::create_dir_all(config.logs_path()).is_err() {
    return;
  }
  let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
  let entry = format!("[{timestamp}] {label}\n{payload}\n\n");
  if let Ok(mut file) = fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(tournament_log_path(config))
  {
    let _ = file.write_all(entry.as_bytes());
  }
}
