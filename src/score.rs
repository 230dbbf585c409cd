//! "A-B" score text parsing and pool-play validity.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreStatus {
  Empty,
  Unparseable,
  Invalid(u32, u32),
  Valid(u32, u32),
}

impl ScoreStatus {
  /// Whether a host should style the score box as invalid.
  pub fn is_flagged(self) -> bool {
    matches!(self, ScoreStatus::Unparseable | ScoreStatus::Invalid(_, _))
  }
}

/// Accepts digits, optional whitespace, `-` or `–`, optional whitespace,
/// digits. Nothing may surround the score.
pub fn parse_score(text: &str) -> Option<(u32, u32)> {
  let (left, rest) = split_digits(text)?;
  let rest = rest.trim_start();
  let rest = rest
    .strip_prefix('-')
    .or_else(|| rest.strip_prefix('\u{2013}'))?;
  let rest = rest.trim_start();
  let (right, tail) = split_digits(rest)?;
  if !tail.is_empty() {
    return None;
  }
  Some((left.parse().ok()?, right.parse().ok()?))
}

fn split_digits(text: &str) -> Option<(&str, &str)> {
  let end = text
    .char_indices()
    .find(|(_, ch)| !ch.is_ascii_digit())
    .map(|(idx, _)| idx)
    .unwrap_or(text.len());
  if end == 0 {
    return None;
  }
  Some(text.split_at(end))
}

/// One game to 21, win by two, no cap.
pub fn is_valid_pool_score(a: u32, b: u32) -> bool {
  a.max(b) >= 21 && a.abs_diff(b) >= 2
}

pub fn pool_score_status(text: &str) -> ScoreStatus {
  if text.trim().is_empty() {
    return ScoreStatus::Empty;
  }
  match parse_score(text) {
    Some((a, b)) if is_valid_pool_score(a, b) => ScoreStatus::Valid(a, b),
    Some((a, b)) => ScoreStatus::Invalid(a, b),
    None => ScoreStatus::Unparseable,
  }
}

pub fn valid_pool_score(text: &str) -> Option<(u32, u32)> {
  match pool_score_status(text) {
    ScoreStatus::Valid(a, b) => Some((a, b)),
    _ => None,
  }
}

/// Parseable and not tied. Playoff scores only need a winner.
pub fn decisive_score(text: &str) -> Option<(u32, u32)> {
  parse_score(text).filter(|(a, b)| a != b)
}
