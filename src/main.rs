use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod auth;
mod cache;
mod config;
mod error;
mod football_data;
mod loading;
mod pairing;
mod plans;
mod proxy;
mod teams;
#[cfg(test)]
mod test_support;

use api::{AppState, SessionStore, DEFAULT_MATCH_STATUS, DEFAULT_MAX_SESSIONS};
use auth::MemoryAuth;
use config::Config;
use football_data::{FootballData, MatchFeed, MatchProvider};
use pairing::{FixedOdds, LoadingBounds};
use proxy::ProxyRelay;
use teams::{FixtureOpponentResolver, OpponentResolver, StaticOpponentResolver, TeamRoster};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let timeout = Duration::from_secs(config.http_timeout_secs);

    // Upstream fixtures/odds, cached for the lifetime of the process
    let provider: Arc<dyn MatchProvider> = Arc::new(FootballData::new(
        &config.football_data_url,
        config.token(),
        timeout,
    )?);
    let feed = MatchFeed::new(provider);

    // Roster and opponent rule are fixed once at startup
    let (roster, resolver) = build_pairing_rule(&config, &feed).await;
    if roster.is_empty() {
        anyhow::bail!("no teams available to pair");
    }
    info!(
        "Roster: {} team(s), opponent resolver: {}",
        roster.len(),
        resolver.name()
    );

    let relay = ProxyRelay::new(config.token(), timeout)?;

    warn!("Using the in-memory auth provider: accounts are lost on restart");
    let auth = Arc::new(MemoryAuth::new());

    let state = AppState {
        relay,
        feed,
        roster: Arc::new(roster),
        resolver,
        auth,
        sessions: SessionStore::with_limits(
            Duration::from_secs(config.session_ttl_secs),
            DEFAULT_MAX_SESSIONS,
        ),
        odds: FixedOdds {
            team_a: config.odds_home,
            team_b: config.odds_away,
        },
        loading: LoadingBounds {
            min_secs: config.loading_min_secs,
            max_secs: config.loading_max_secs,
        },
        tick: loading::TICK_INTERVAL,
    };

    let app = api::router(state);
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Unagi API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run API server (blocks until shutdown)
    axum::serve(listener, app).await?;

    Ok(())
}

/// Derive the roster and opponents from today's fixtures when competitions
/// are configured, falling back to the static rule.
async fn build_pairing_rule(
    config: &Config,
    feed: &MatchFeed,
) -> (TeamRoster, Arc<dyn OpponentResolver>) {
    let competitions = config.competition_codes();
    if !competitions.is_empty() {
        let today = chrono::Local::now().date_naive();
        let fixtures = feed
            .fixtures(&competitions, DEFAULT_MATCH_STATUS, today)
            .await;
        if !fixtures.is_empty() {
            let resolver = FixtureOpponentResolver::from_fixtures(&fixtures);
            let roster = TeamRoster::new(resolver.teams().iter().map(|t| t.name().to_string()));
            info!(
                "Loaded {} fixture(s) from {:?}",
                fixtures.len(),
                competitions
            );
            return (roster, Arc::new(resolver));
        }
        warn!(
            "No fixtures today for {:?}; using the static pairing rule",
            competitions
        );
    }
    (
        TeamRoster::default(),
        Arc::new(StaticOpponentResolver::default()),
    )
}
