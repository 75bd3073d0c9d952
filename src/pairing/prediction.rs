//! Odds → percentage split.
//!
//! Decimal odds imply a probability of `1/odds`. The two implied
//! probabilities are renormalized to remove the bookmaker margin:
//!
//!   pct_a = round(100 · (1/odds_a) / (1/odds_a + 1/odds_b))
//!   pct_b = 100 − pct_a
//!
//! so the pair always sums to exactly 100.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::teams::Team;

/// Display format for the "now" line above a prediction.
pub const TIMESTAMP_FORMAT: &str = "%A, %-d %B, %H:%M";

/// The two odds constants every prediction is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedOdds {
    pub team_a: f64,
    pub team_b: f64,
}

impl Default for FixedOdds {
    fn default() -> Self {
        FixedOdds {
            team_a: 1.80,
            team_b: 2.20,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamOutcome {
    pub team: Team,
    pub percentage: u8,
    pub odds: f64,
}

/// Rendered fresh on every request; never cached.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub team_a: TeamOutcome,
    pub team_b: TeamOutcome,
    pub generated_at: DateTime<Local>,
    pub formatted_at: String,
}

impl PredictionResult {
    pub fn compute(team_a: Team, team_b: Team, odds: FixedOdds, now: DateTime<Local>) -> Self {
        let (pct_a, pct_b) = percentage_split(odds.team_a, odds.team_b);
        PredictionResult {
            team_a: TeamOutcome {
                team: team_a,
                percentage: pct_a,
                odds: odds.team_a,
            },
            team_b: TeamOutcome {
                team: team_b,
                percentage: pct_b,
                odds: odds.team_b,
            },
            generated_at: now,
            formatted_at: now.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Percentage split for two decimal odds. Both odds must be positive.
pub fn percentage_split(odds_a: f64, odds_b: f64) -> (u8, u8) {
    debug_assert!(odds_a > 0.0 && odds_b > 0.0, "odds must be positive");
    let implied_a = 1.0 / odds_a;
    let implied_b = 1.0 / odds_b;
    let pct_a = (100.0 * implied_a / (implied_a + implied_b))
        .round()
        .clamp(0.0, 100.0) as u8;
    (pct_a, 100 - pct_a)
}
