//! Sign-in endpoints
//!
//! `/signin/` starts the identity provider handshake with a random state kept
//! in a short-lived signed cookie; the callback only accepts a matching state.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect},
    routing::get,
    Router,
};
use serde::Deserialize;

use super::middleware::{ApiError, AppState};
use crate::auth::session::STATE_MAX_AGE_SECONDS;
use crate::auth::{read_cookie, AuthError, SESSION_COOKIE, STATE_COOKIE};

const CALLBACK_PATH: &str = "/signin/callback/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signin/", get(signin))
        .route(CALLBACK_PATH, get(callback))
        .route("/signout/", get(signout))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /signin/ - off to the identity provider
async fn signin(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let signed = state.sessions.sign(&nonce, STATE_MAX_AGE_SECONDS)?;
    let redirect_uri = state.server.external_url(CALLBACK_PATH);

    let location = state.identity_provider.authorize_url(&nonce, &redirect_uri);
    Ok((
        AppendHeaders([(header::SET_COOKIE, state.sessions.state_cookie(&signed))]),
        Redirect::to(&location),
    ))
}

/// GET /signin/callback/ - finish the handshake and start a session
async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let expected: Option<String> =
        read_cookie(&headers, STATE_COOKIE).and_then(|cookie| state.sessions.verify(&cookie));
    match (expected, query.state.as_deref()) {
        (Some(expected), Some(returned)) if expected == returned => {}
        _ => return Err(AuthError::StateMismatch.into()),
    }

    if let Some(error) = query.error {
        let reason = query.error_description.unwrap_or(error);
        return Err(AuthError::Denied(reason).into());
    }
    let code = query.code.ok_or(AuthError::MissingCode)?;

    let redirect_uri = state.server.external_url(CALLBACK_PATH);
    let identity = state
        .identity_provider
        .authenticate(&code, &redirect_uri)
        .await?;
    let token = state.sessions.encode_identity(&identity)?;

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, state.sessions.session_cookie(&token)),
            (header::SET_COOKIE, state.sessions.clear_cookie(STATE_COOKIE)),
        ]),
        Redirect::to("/"),
    ))
}

/// GET /signout/ - drop the session and sign out at the provider too
async fn signout(State(state): State<AppState>) -> impl IntoResponse {
    let return_to = state.server.external_url("/");
    let location = state.identity_provider.logout_url(&return_to);
    (
        AppendHeaders([(header::SET_COOKIE, state.sessions.clear_cookie(SESSION_COOKIE))]),
        Redirect::to(&location),
    )
}
