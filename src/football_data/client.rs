use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::provider::MatchProvider;

/// Header football-data.org reads the API token from.
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Client for the football-data.org v4 REST API.
/// Docs: <https://www.football-data.org/documentation/api>
#[derive(Clone)]
pub struct FootballData {
    http: Client,
    base_url: String,
    token: String,
}

impl FootballData {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(FootballData {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// `competitions/{id}/matches?status=..&dateFrom=..&dateTo=..`, with
    /// the same day as both bounds.
    pub fn matches_url(&self, competition: &str, status: &str, date: NaiveDate) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/competitions/{}/matches",
            self.base_url, competition
        ))
        .context("Invalid football-data base URL")?;
        let day = date.format("%Y-%m-%d").to_string();
        url.query_pairs_mut()
            .append_pair("status", status)
            .append_pair("dateFrom", &day)
            .append_pair("dateTo", &day);
        Ok(url)
    }

    pub fn odds_url(&self, match_id: &str) -> Result<Url> {
        Url::parse(&format!("{}/matches/{}/odds", self.base_url, match_id))
            .context("Invalid football-data base URL")
    }

    async fn get_json(&self, url: Url) -> Result<serde_json::Value> {
        debug!("football-data GET {}", url);
        let resp = self
            .http
            .get(url)
            .header(AUTH_HEADER, &self.token)
            .send()
            .await
            .context("football-data request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("football-data error {}: {}", status, body);
        }

        resp.json()
            .await
            .context("Failed to parse football-data response")
    }
}

#[async_trait]
impl MatchProvider for FootballData {
    fn name(&self) -> &str {
        "football-data"
    }

    async fn fetch_matches(
        &self,
        competition: &str,
        status: &str,
        date: NaiveDate,
    ) -> Result<Vec<serde_json::Value>> {
        let url = self.matches_url(competition, status, date)?;
        let raw = self.get_json(url).await?;
        let matches = raw["matches"].as_array().cloned().unwrap_or_default();
        info!(
            "Fetched {} {} matches for {} on {}",
            matches.len(),
            status,
            competition,
            date
        );
        Ok(matches)
    }

    async fn fetch_odds(&self, match_id: &str) -> Result<serde_json::Value> {
        let url = self.odds_url(match_id)?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;
    use axum::{extract::Query, http::HeaderMap, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn client(base: &str) -> FootballData {
        FootballData::new(base, "secret", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_matches_url_uses_same_day_bounds() {
        let fd = client("https://api.football-data.org/v4/");
        let date = NaiveDate::from_ymd_opt(2025, 10, 26).unwrap();
        let url = fd.matches_url("PD", "SCHEDULED", date).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.football-data.org/v4/competitions/PD/matches?status=SCHEDULED&dateFrom=2025-10-26&dateTo=2025-10-26"
        );
    }

    #[test]
    fn test_odds_url() {
        let fd = client("https://api.football-data.org/v4");
        assert_eq!(
            fd.odds_url("327117").unwrap().as_str(),
            "https://api.football-data.org/v4/matches/327117/odds"
        );
    }

    #[tokio::test]
    async fn test_fetch_matches_sends_token_and_reads_array() {
        let app = Router::new().route(
            "/competitions/:comp/matches",
            get(
                |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                    if headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok()) != Some("secret") {
                        return (StatusCode::FORBIDDEN, Json(json!({ "message": "no token" })));
                    }
                    (
                        StatusCode::OK,
                        Json(json!({
                            "matches": [{ "id": 1, "status": q.get("status") }]
                        })),
                    )
                },
            ),
        );
        let base = spawn_upstream(app).await;
        let fd = client(&base);
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let matches = fd.fetch_matches("PD", "LIVE", date).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["status"], "LIVE");
    }

    #[tokio::test]
    async fn test_fetch_odds_non_success_is_error() {
        let app = Router::new().route(
            "/matches/:id/odds",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = spawn_upstream(app).await;
        let err = client(&base).fetch_odds("9").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
