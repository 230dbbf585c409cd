use std::collections::{HashMap, HashSet};

use crate::types::Gender;

/// Comparison key for a roster name: trimmed, lowercased, internal
/// whitespace collapsed to single spaces.
pub fn slug(raw: &str) -> String {
  raw
    .split_whitespace()
    .map(|part| part.to_lowercase())
    .collect::<Vec<_>>()
    .join(" ")
}

/// Newline-delimited roster text into display names: trimmed, blanks
/// dropped, first spelling kept for duplicate slugs.
pub fn parse_roster_text(text: &str) -> Vec<String> {
  dedupe_names(text.lines())
}

pub fn dedupe_names<I, S>(names: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut seen = HashSet::new();
  let mut out = Vec::new();
  for name in names {
    let trimmed = name.as_ref().trim();
    if trimmed.is_empty() {
      continue;
    }
    if seen.insert(slug(trimmed)) {
      out.push(trimmed.to_string());
    }
  }
  out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
  Guy,
  Girl,
  Unknown,
}

impl From<Gender> for Membership {
  fn from(gender: Gender) -> Self {
    match gender {
      Gender::Guy => Membership::Guy,
      Gender::Girl => Membership::Girl,
    }
  }
}

/// Both rosters keyed by slug. Names found in neither roster stay
/// `Unknown` until the caller assigns them a gender.
#[derive(Clone, Debug, Default)]
pub struct RosterIndex {
  guys: Vec<String>,
  girls: Vec<String>,
  by_slug: HashMap<String, Gender>,
  display: HashMap<String, String>,
  extra_guys: Vec<String>,
  extra_girls: Vec<String>,
}

impl RosterIndex {
  pub fn new(guys: &[String], girls: &[String]) -> Self {
    let guys = dedupe_names(guys);
    let girls = dedupe_names(girls);
    let mut by_slug = HashMap::new();
    let mut display = HashMap::new();
    // A name on both rosters counts as a guy.
    for name in &girls {
      by_slug.insert(slug(name), Gender::Girl);
      display.insert(slug(name), name.clone());
    }
    for name in &guys {
      by_slug.insert(slug(name), Gender::Guy);
      display.insert(slug(name), name.clone());
    }
    RosterIndex {
      guys,
      girls,
      by_slug,
      display,
      extra_guys: Vec::new(),
      extra_girls: Vec::new(),
    }
  }

  pub fn membership(&self, name: &str) -> Membership {
    self
      .by_slug
      .get(&slug(name))
      .copied()
      .map(Membership::from)
      .unwrap_or(Membership::Unknown)
  }

  /// Resolves a name missing from both rosters. Assigned names are ranked
  /// with their gender's standings.
  pub fn assign(&mut self, name: &str, gender: Gender) {
    let key = slug(name);
    if key.is_empty() || self.by_slug.contains_key(&key) {
      return;
    }
    self.by_slug.insert(key.clone(), gender);
    self.display.insert(key, name.trim().to_string());
    match gender {
      Gender::Guy => self.extra_guys.push(name.trim().to_string()),
      Gender::Girl => self.extra_girls.push(name.trim().to_string()),
    }
  }

  /// Roster display spelling for a name, or the trimmed name itself.
  pub fn display_name(&self, name: &str) -> String {
    self
      .display
      .get(&slug(name))
      .cloned()
      .unwrap_or_else(|| name.trim().to_string())
  }

  pub fn guys(&self) -> &[String] {
    &self.guys
  }

  pub fn girls(&self) -> &[String] {
    &self.girls
  }

  /// Rostered names followed by names resolved through `assign`.
  pub fn ranked_names(&self, gender: Gender) -> impl Iterator<Item = &String> {
    let (listed, extra) = match gender {
      Gender::Guy => (&self.guys, &self.extra_guys),
      Gender::Girl => (&self.girls, &self.extra_girls),
    };
    listed.iter().chain(extra.iter())
  }
}
