use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::auth::{AuthSession, SignUp, User};
use crate::error::ApiError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SignUpBody {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

/// Session token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpBody>,
) -> Result<(StatusCode, Json<SignUp>), ApiError> {
    let signup = state
        .auth
        .sign_up(&body.email, &body.password, body.display_name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(signup)))
}

/// POST /api/auth/sign-in
///
/// Returns `{token, user}`; the token identifies this login on `me` and
/// `sign-out`.
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInBody>,
) -> Result<Json<AuthSession>, ApiError> {
    let session = state.auth.sign_in(&body.email, &body.password).await?;
    Ok(Json(session))
}

/// POST /api/auth/sign-out
///
/// Ends only the login named by the bearer token. Unknown tokens are a no-op.
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
    state.auth.sign_out(token).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/verify?token=
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<User>, ApiError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing token param".to_string()))?;
    let user = state.auth.verify_email(&token).await?;
    Ok(Json(user))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let user = match bearer_token(&headers) {
        Some(token) => state.auth.current_user(token).await,
        None => None,
    };
    Json(json!({ "user": user }))
}
