//! HTTP façade — the six API routes plus a health probe.
//!
//! Handlers marshal request JSON into collaborator calls and collaborator
//! results back into response JSON; every storage key derives from the uid
//! bound to the verified token, never from client input.

use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::error::{ApiError, RelayError};
use crate::identity::IdentityGateway;
use crate::relay::ConversationRelay;
use crate::store::{TranscriptEntry, UserStore};

/// Collaborator handles shared across handlers. Built once at startup and
/// read-only for the process lifetime.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityGateway>,
    pub relay: Arc<dyn ConversationRelay>,
    pub store: Arc<dyn UserStore>,
}

/// Build the Axum router over the three injected collaborators.
pub fn api_routes(
    identity: Arc<dyn IdentityGateway>,
    relay: Arc<dyn ConversationRelay>,
    store: Arc<dyn UserStore>,
) -> Router {
    let state = AppState {
        identity,
        relay,
        store,
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/signup", post(signup))
        .route("/api/signin", post(signin))
        .route("/api/sendchatmessage", post(send_chat_message))
        .route("/api/adduserdata", post(add_user_data))
        .route("/api/user", get(get_user_data))
        .route("/api/usermessages", get(get_user_messages))
        .with_state(state)
}

// ── Authentication guard ────────────────────────────────────────────────

/// Uid bound to a verified session token.
///
/// Composed ahead of each protected handler; extraction fails the request
/// with 401 before the handler body runs, so no collaborator write can
/// happen on an unauthenticated request. The `authorization` header carries
/// the raw token value, no `Bearer` scheme.
pub struct VerifiedUser(pub String);

impl FromRequestParts<AppState> for VerifiedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::NoToken)?;

        match state.identity.verify_token(token).await {
            Ok(uid) => Ok(VerifiedUser(uid)),
            Err(e) => {
                // Malformed, expired, signature mismatch — all one outcome.
                debug!(error = %e, "Token verification failed");
                Err(ApiError::InvalidToken)
            }
        }
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "chat-gateway"
    }))
}

// ── Account routes ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CredentialsBody {
    email: Option<String>,
    password: Option<String>,
}

async fn signup(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Value>, ApiError> {
    let (email, password) = match (body.email, body.password) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(ApiError::MissingCredentials),
    };

    let uid = state
        .identity
        .create_user(&email, &password)
        .await
        .map_err(|e| {
            warn!(error = %e, "User creation failed");
            ApiError::CreateUserFailed
        })?;

    info!(%uid, "User created");
    Ok(Json(json!({
        "message": format!("Successfully created user {uid}")
    })))
}

async fn signin(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Value>, ApiError> {
    let (email, password) = match (body.email, body.password) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(ApiError::SignInFailed),
    };

    let token = state
        .identity
        .sign_in(&email, &password)
        .await
        .map_err(|e| {
            warn!(error = %e, "Sign-in failed");
            ApiError::SignInFailed
        })?;

    Ok(Json(json!({ "token": token })))
}

// ── Chat routes ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatBody {
    message: String,
}

async fn send_chat_message(
    State(state): State<AppState>,
    VerifiedUser(uid): VerifiedUser,
    Json(body): Json<ChatBody>,
) -> Result<Json<Value>, ApiError> {
    // The NLU session is the user id itself.
    let reply = state
        .relay
        .detect_intent(&uid, &body.message)
        .await
        .map_err(|e| {
            if matches!(&e, RelayError::InvalidArgument) {
                warn!(%uid, "Relay rejected the message");
            }
            ApiError::from(e)
        })?;

    // Transcript writes only after a successful relay response, user turn
    // before bot turn. The two pushes are independent calls; a crash in
    // between leaves a user turn with no bot reply.
    state
        .store
        .push_transcript_entry(&uid, &TranscriptEntry::user(&body.message))
        .await?;
    state
        .store
        .push_transcript_entry(&uid, &TranscriptEntry::bot(&reply))
        .await?;

    Ok(Json(json!({ "response": reply })))
}

// ── Profile routes ──────────────────────────────────────────────────────

async fn add_user_data(
    State(state): State<AppState>,
    VerifiedUser(uid): VerifiedUser,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    // Independent per-field merges, not an atomic multi-field write.
    for (field, value) in &fields {
        state.store.update_profile_field(&uid, field, value).await?;
    }

    let profile = state.store.get_profile(&uid).await?;
    Ok(Json(profile))
}

async fn get_user_data(
    State(state): State<AppState>,
    VerifiedUser(uid): VerifiedUser,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let profile = state.store.get_profile(&uid).await?;
    Ok(Json(profile))
}

async fn get_user_messages(
    State(state): State<AppState>,
    VerifiedUser(uid): VerifiedUser,
) -> Result<Json<Value>, ApiError> {
    // Absent transcript reads back as `{}`, a populated one as the store's
    // keyed-by-push-id object. Clients rely on both shapes.
    match state.store.get_transcript(&uid).await? {
        Value::Null => Ok(Json(json!({}))),
        transcript => Ok(Json(transcript)),
    }
}
