//! Pairing sessions: one state machine per browser page.
//!
//! A session expires once it goes untouched for the store's TTL; expired
//! sessions are pruned whenever a new one is created, and the store never
//! holds more than its cap. Dropping a session's loading handle (by
//! re-picking a team, deleting or expiring the session) stops its driver
//! task.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::loading::{spawn_driver, LoadingFrame, SharedLoading};
use crate::pairing::{PairingMachine, PairingSnapshot};
use crate::teams::Team;

use super::{AppState, SearchQuery};

pub struct Session {
    machine: PairingMachine,
    loading: Option<SharedLoading>,
}

pub type SharedSession = Arc<Mutex<Session>>;

/// Idle time after which a session expires.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Most sessions held at once; the least recently used goes first.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct Entry {
    session: SharedSession,
    touched: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        SessionStore::with_limits(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        SessionStore {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn create(&self, machine: PairingMachine) -> (String, SharedSession) {
        let id = format!("{:016x}", rand::thread_rng().gen::<u64>());
        let session = Arc::new(Mutex::new(Session {
            machine,
            loading: None,
        }));

        let now = Instant::now();
        let mut inner = self.inner.write().await;
        let before = inner.len();
        inner.retain(|_, entry| now.duration_since(entry.touched) < self.ttl);
        let expired = before - inner.len();
        if expired > 0 {
            debug!("Pruned {} expired session(s)", expired);
        }
        while inner.len() >= self.max_sessions {
            let oldest = inner
                .iter()
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest) => {
                    inner.remove(&oldest);
                    debug!("Evicted session {} (store full)", oldest);
                }
                None => break,
            }
        }
        inner.insert(
            id.clone(),
            Entry {
                session: session.clone(),
                touched: now,
            },
        );
        (id, session)
    }

    /// Look a session up and mark it as used. Expired sessions are gone even
    /// before the next prune.
    pub async fn get(&self, id: &str) -> Result<SharedSession, ApiError> {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        match inner.get_mut(id) {
            Some(entry) if now.duration_since(entry.touched) < self.ttl => {
                entry.touched = now;
                Ok(entry.session.clone())
            }
            Some(_) => {
                inner.remove(id);
                Err(not_found(id))
            }
            None => Err(not_found(id)),
        }
    }

    pub async fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.inner
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("session {}", id))
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: String,
    /// Whether the last selection was taken; absent for plain reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    pub pairing: PairingSnapshot,
    pub loading: Option<LoadingFrame>,
}

async fn view(id: String, session: &Session, accepted: Option<bool>) -> SessionView {
    let loading = match &session.loading {
        Some(seq) => Some(seq.lock().await.frame()),
        None => None,
    };
    SessionView {
        id,
        accepted,
        pairing: session.machine.snapshot(),
        loading,
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamBody {
    pub team: String,
}

/// POST /api/sessions
pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let machine = state.new_machine();
    let (id, session) = state.sessions.create(machine).await;
    info!(
        "Pairing session {} created ({} open)",
        id,
        state.sessions.len().await
    );
    let session = session.lock().await;
    (StatusCode::CREATED, Json(view(id, &session, None).await))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let session = session.lock().await;
    Ok(Json(view(id, &session, None).await))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(&id).await?;
    info!("Pairing session {} closed", id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/sessions/:id/opponents?q=
pub async fn opponent_suggestions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Team>>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let session = session.lock().await;
    let teams = match query.q.as_deref() {
        Some(term) => session.machine.opponent_suggestions(term),
        None => session.machine.opponents().to_vec(),
    };
    Ok(Json(teams))
}

/// POST /api/sessions/:id/team-a
pub async fn choose_team_a(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TeamBody>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;
    let accepted = session.machine.choose_team_a(&body.team);
    if accepted {
        session.loading = None;
    }
    Ok(Json(view(id, &session, Some(accepted)).await))
}

/// POST /api/sessions/:id/team-b
pub async fn choose_team_b(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TeamBody>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;
    let accepted = session.machine.choose_team_b(&body.team);
    if accepted {
        session.loading = None;
    }
    Ok(Json(view(id, &session, Some(accepted)).await))
}

/// POST /api/sessions/:id/predict
pub async fn request_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;
    let sequence = session
        .machine
        .request_prediction(&mut rand::thread_rng())
        .ok_or_else(|| ApiError::Conflict("choose both teams before predicting".to_string()))?;

    debug!(
        "Session {} loading run {} for {:?}",
        id,
        sequence.ticket(),
        sequence.duration()
    );
    let shared: SharedLoading = Arc::new(Mutex::new(sequence));
    spawn_driver(&shared, state.tick);
    session.loading = Some(shared);
    Ok((StatusCode::ACCEPTED, Json(view(id, &session, None).await)))
}

/// POST /api/sessions/:id/continue
pub async fn continue_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;
    let Some(loading) = session.loading.clone() else {
        return Err(ApiError::Conflict("no prediction is loading".to_string()));
    };
    let completion = loading
        .lock()
        .await
        .complete()
        .ok_or_else(|| ApiError::Conflict("loading not complete".to_string()))?;

    session.loading = None;
    if let Some(result) = session.machine.complete_prediction(completion, Local::now()) {
        info!(
            "Session {}: {} {}% vs {} {}% ({:.3}s)",
            id,
            result.team_a.team,
            result.team_a.percentage,
            result.team_b.team,
            result.team_b.percentage,
            completion.duration.as_secs_f64()
        );
    }
    Ok(Json(view(id, &session, None).await))
}
