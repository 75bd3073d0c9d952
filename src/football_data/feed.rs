//! Cached access to fixtures and odds.
//!
//! Upstream failures never reach the caller as errors: they are logged and
//! degrade to "no data" (an empty match list or no odds).

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

use crate::cache::ResultCache;

use super::models::{parse_fixtures, Fixture};
use super::provider::MatchProvider;

/// A match-data provider fronted by per-session result caches.
#[derive(Clone)]
pub struct MatchFeed {
    provider: Arc<dyn MatchProvider>,
    matches: ResultCache<Vec<serde_json::Value>>,
    odds: ResultCache<serde_json::Value>,
}

impl MatchFeed {
    pub fn new(provider: Arc<dyn MatchProvider>) -> Self {
        MatchFeed {
            provider,
            matches: ResultCache::new("matches"),
            odds: ResultCache::new("odds"),
        }
    }

    /// Cache key for a match list. The date is not part of the key, so a
    /// long-running process keeps serving the first day it fetched.
    pub fn matches_key(competition: &str, status: &str) -> String {
        format!("{}-{}", competition, status)
    }

    pub async fn matches(
        &self,
        competition: &str,
        status: &str,
        date: NaiveDate,
    ) -> Vec<serde_json::Value> {
        let key = Self::matches_key(competition, status);
        let result = self
            .matches
            .get_or_fetch(&key, || {
                self.provider.fetch_matches(competition, status, date)
            })
            .await;
        match result {
            Ok(matches) => matches,
            Err(e) => {
                warn!(
                    "{} matches [{}][{}] unavailable: {:#}",
                    self.provider.name(),
                    competition,
                    status,
                    e
                );
                vec![]
            }
        }
    }

    pub async fn odds(&self, match_id: &str) -> Option<serde_json::Value> {
        let result = self
            .odds
            .get_or_fetch(match_id, || self.provider.fetch_odds(match_id))
            .await;
        match result {
            Ok(odds) => Some(odds),
            Err(e) => {
                warn!(
                    "{} odds for match {} unavailable: {:#}",
                    self.provider.name(),
                    match_id,
                    e
                );
                None
            }
        }
    }

    /// Fixtures across several competitions, fetched concurrently.
    pub async fn fixtures(
        &self,
        competitions: &[String],
        status: &str,
        date: NaiveDate,
    ) -> Vec<Fixture> {
        let fetches = competitions
            .iter()
            .map(|comp| self.matches(comp, status, date));
        futures_util::future::join_all(fetches)
            .await
            .iter()
            .flat_map(|matches| parse_fixtures(matches))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeProvider {
        match_calls: AtomicUsize,
        odds_calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl MatchProvider for FakeProvider {
        async fn fetch_matches(
            &self,
            competition: &str,
            _status: &str,
            _date: NaiveDate,
        ) -> Result<Vec<serde_json::Value>> {
            self.match_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("upstream down");
            }
            Ok(vec![json!({
                "id": 1,
                "homeTeam": { "name": format!("{} home", competition) },
                "awayTeam": { "name": format!("{} away", competition) }
            })])
        }

        async fn fetch_odds(&self, match_id: &str) -> Result<serde_json::Value> {
            self.odds_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("upstream down");
            }
            Ok(json!({ "match": match_id, "homeWin": 1.8 }))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 26).unwrap()
    }

    #[tokio::test]
    async fn test_matches_fetched_once_per_key() {
        let provider = Arc::new(FakeProvider::default());
        let feed = MatchFeed::new(provider.clone());

        let first = feed.matches("PD", "SCHEDULED", today()).await;
        let second = feed.matches("PD", "SCHEDULED", today()).await;
        assert_eq!(first, second);
        assert_eq!(provider.match_calls.load(Ordering::SeqCst), 1);

        feed.matches("PD", "LIVE", today()).await;
        assert_eq!(provider.match_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_odds_fetched_once_per_match() {
        let provider = Arc::new(FakeProvider::default());
        let feed = MatchFeed::new(provider.clone());

        assert!(feed.odds("77").await.is_some());
        assert!(feed.odds("77").await.is_some());
        assert_eq!(provider.odds_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_degrade_and_retry_later() {
        let provider = Arc::new(FakeProvider {
            fail: true,
            ..Default::default()
        });
        let feed = MatchFeed::new(provider.clone());

        assert!(feed.matches("PD", "SCHEDULED", today()).await.is_empty());
        assert!(feed.matches("PD", "SCHEDULED", today()).await.is_empty());
        // Nothing was cached, so both calls hit the provider.
        assert_eq!(provider.match_calls.load(Ordering::SeqCst), 2);
        assert!(feed.odds("1").await.is_none());
    }

    #[tokio::test]
    async fn test_fixtures_merge_competitions() {
        let provider = Arc::new(FakeProvider::default());
        let feed = MatchFeed::new(provider);
        let fixtures = feed
            .fixtures(&["PD".to_string(), "PL".to_string()], "SCHEDULED", today())
            .await;
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].home_team, "PD home");
        assert_eq!(fixtures[1].home_team, "PL home");
    }

    #[test]
    fn test_matches_key_format() {
        assert_eq!(MatchFeed::matches_key("PD", "SCHEDULED"), "PD-SCHEDULED");
    }
}
