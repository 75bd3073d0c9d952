//! Opponent derivation: given team A, which teams may be picked as team B.

use std::collections::HashMap;

use crate::football_data::Fixture;

use super::normalize::normalize;
use super::roster::Team;

/// Capability that derives the OpponentSet for a chosen team A.
pub trait OpponentResolver: Send + Sync {
    /// Ordered opponents for `team`. Empty when the team has no fixture.
    fn opponents(&self, team: &Team) -> Vec<Team>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Fixed adjacency table keyed by normalized team name.
pub struct StaticOpponentResolver {
    table: HashMap<String, Vec<Team>>,
}

impl StaticOpponentResolver {
    pub fn new() -> Self {
        StaticOpponentResolver {
            table: HashMap::new(),
        }
    }

    /// Add a one-directional rule: choosing `team` offers `opponent`.
    pub fn with_rule(mut self, team: &str, opponent: &str) -> Self {
        let entry = self.table.entry(normalize(team)).or_default();
        let opponent = Team::new(opponent);
        if !entry.contains(&opponent) {
            entry.push(opponent);
        }
        self
    }
}

impl Default for StaticOpponentResolver {
    /// Only Real Madrid has a listed opponent.
    fn default() -> Self {
        StaticOpponentResolver::new().with_rule("Real Madrid", "Barcelona")
    }
}

impl OpponentResolver for StaticOpponentResolver {
    fn opponents(&self, team: &Team) -> Vec<Team> {
        self.table.get(&team.key()).cloned().unwrap_or_default()
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Opponents derived from a fixture list, in both directions.
pub struct FixtureOpponentResolver {
    table: HashMap<String, Vec<Team>>,
}

impl FixtureOpponentResolver {
    pub fn from_fixtures(fixtures: &[Fixture]) -> Self {
        let mut table: HashMap<String, Vec<Team>> = HashMap::new();
        for fixture in fixtures {
            let home = Team::new(fixture.home_team.as_str());
            let away = Team::new(fixture.away_team.as_str());
            if home == away {
                continue;
            }
            for (side, other) in [(&home, &away), (&away, &home)] {
                let entry = table.entry(side.key()).or_default();
                if !entry.contains(other) {
                    entry.push(other.clone());
                }
            }
        }
        FixtureOpponentResolver { table }
    }

    /// Every team that appears in at least one fixture.
    pub fn teams(&self) -> Vec<Team> {
        let mut teams: Vec<Team> = self
            .table
            .values()
            .flatten()
            .cloned()
            .collect();
        teams.sort_by_key(|t| t.key());
        teams.dedup();
        teams
    }
}

impl OpponentResolver for FixtureOpponentResolver {
    fn opponents(&self, team: &Team) -> Vec<Team> {
        self.table.get(&team.key()).cloned().unwrap_or_default()
    }

    fn name(&self) -> &str {
        "fixtures"
    }
}
