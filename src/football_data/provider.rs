use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait every fixtures/odds data source must implement.
///
/// Payloads are kept as raw JSON; callers pick out what they display.
#[async_trait]
pub trait MatchProvider: Send + Sync {
    /// Matches of `competition` with the given status on `date`.
    async fn fetch_matches(
        &self,
        competition: &str,
        status: &str,
        date: NaiveDate,
    ) -> Result<Vec<serde_json::Value>>;

    /// Odds payload for one match.
    async fn fetch_odds(&self, match_id: &str) -> Result<serde_json::Value>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
