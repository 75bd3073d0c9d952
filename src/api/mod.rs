use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

pub mod auth;
pub mod sessions;

use crate::auth::AuthProvider;
use crate::error::ApiError;
use crate::football_data::MatchFeed;
use crate::pairing::{FixedOdds, LoadingBounds, PairingMachine};
use crate::plans::{catalogue, Lang, PlanCatalogue};
use crate::proxy::ProxyRelay;
use crate::teams::{OpponentResolver, Team, TeamRoster};

pub use sessions::{SessionStore, DEFAULT_MAX_SESSIONS};

/// Status used when `/api/matches` is called without one.
pub const DEFAULT_MATCH_STATUS: &str = "SCHEDULED";

#[derive(Clone)]
pub struct AppState {
    pub relay: ProxyRelay,
    pub feed: MatchFeed,
    pub roster: Arc<TeamRoster>,
    pub resolver: Arc<dyn OpponentResolver>,
    pub auth: Arc<dyn AuthProvider>,
    pub sessions: SessionStore,
    pub odds: FixedOdds,
    pub loading: LoadingBounds,
    /// Loading driver refresh period.
    pub tick: Duration,
}

impl AppState {
    pub fn new_machine(&self) -> PairingMachine {
        PairingMachine::new(
            self.roster.clone(),
            self.resolver.clone(),
            self.odds,
            self.loading,
        )
    }
}

/// Build the Axum router for the API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/football-proxy", get(proxy_handler))
        .route("/api/teams", get(teams_handler))
        .route("/api/teams/:team/opponents", get(opponents_handler))
        .route("/api/matches", get(matches_handler))
        .route("/api/odds/:match_id", get(odds_handler))
        .route("/api/plans", get(plans_handler))
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/api/sessions/:id/opponents", get(sessions::opponent_suggestions))
        .route("/api/sessions/:id/team-a", post(sessions::choose_team_a))
        .route("/api/sessions/:id/team-b", post(sessions::choose_team_b))
        .route("/api/sessions/:id/predict", post(sessions::request_prediction))
        .route("/api/sessions/:id/continue", post(sessions::continue_prediction))
        .route("/api/auth/sign-up", post(auth::sign_up))
        .route("/api/auth/sign-in", post(auth::sign_in))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/auth/me", get(auth::me))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    pub competition: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlansQuery {
    pub lang: Option<Lang>,
}

/// GET /api/football-proxy?url=
async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProxyQuery>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let (status, body) = state.relay.relay(query.url.as_deref()).await?;
    Ok((status, Json(body)))
}

/// GET /api/teams?q=
async fn teams_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Team>> {
    let teams = match query.q.as_deref() {
        Some(term) => state.roster.suggest(term),
        None => state.roster.teams().to_vec(),
    };
    Json(teams)
}

/// GET /api/teams/:team/opponents
async fn opponents_handler(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
) -> Result<Json<Vec<Team>>, ApiError> {
    let team = state
        .roster
        .find(&team)
        .ok_or_else(|| ApiError::NotFound(format!("team '{}'", team)))?;
    Ok(Json(state.resolver.opponents(team)))
}

/// GET /api/matches?competition=&status=
async fn matches_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchesQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let competition = query
        .competition
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing competition param".to_string()))?;
    let status = query
        .status
        .unwrap_or_else(|| DEFAULT_MATCH_STATUS.to_string());
    let matches = state
        .feed
        .matches(&competition, &status, Local::now().date_naive())
        .await;
    Ok(Json(json!({ "matches": matches })))
}

/// GET /api/odds/:match_id
async fn odds_handler(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .feed
        .odds(&match_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("odds for match {}", match_id)))
}

/// GET /api/plans?lang=
async fn plans_handler(Query(query): Query<PlansQuery>) -> Json<PlanCatalogue> {
    Json(catalogue(query.lang.unwrap_or_default()))
}
