use serde::{Deserialize, Serialize};

use super::normalize::normalize;

/// A named participant in a match-up. Identity is the normalized name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team(String);

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Team(name.into())
    }

    /// Display name as it was seeded.
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn key(&self) -> String {
        normalize(&self.0)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.key() == normalize(name)
    }
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Team {}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Teams seeded at startup.
pub const DEFAULT_ROSTER: &[&str] = &["Real Madrid", "Barcelona"];

/// Ordered, immutable collection of selectable teams.
#[derive(Debug, Clone)]
pub struct TeamRoster {
    teams: Vec<Team>,
}

impl TeamRoster {
    /// Build a roster, dropping later duplicates (by normalized name).
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut teams: Vec<Team> = Vec::new();
        for name in names {
            let team = Team::new(name);
            if !teams.contains(&team) {
                teams.push(team);
            }
        }
        TeamRoster { teams }
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Roster entry for `name`, compared case- and diacritic-insensitively.
    pub fn find(&self, name: &str) -> Option<&Team> {
        let key = normalize(name);
        self.teams.iter().find(|t| t.key() == key)
    }

    /// Autocomplete candidates: every team whose normalized name contains the
    /// normalized term, in roster order. A blank term yields nothing.
    pub fn suggest(&self, term: &str) -> Vec<Team> {
        filter_by_term(&self.teams, term)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

impl Default for TeamRoster {
    fn default() -> Self {
        TeamRoster::new(DEFAULT_ROSTER.iter().copied())
    }
}

/// Teams whose normalized name contains the normalized `term`.
pub fn filter_by_term(teams: &[Team], term: &str) -> Vec<Team> {
    let term = normalize(term.trim());
    if term.is_empty() {
        return vec![];
    }
    teams
        .iter()
        .filter(|t| t.key().contains(&term))
        .cloned()
        .collect()
}
