//! Request identity middleware

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;

use super::session::{read_cookie, SessionCodec, SESSION_COOKIE};
use crate::models::SessionIdentity;

/// The signed-in visitor, if any, for the current request
#[derive(Debug, Clone, Default)]
pub struct CurrentIdentity(pub Option<SessionIdentity>);

impl CurrentIdentity {
    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.0.as_ref()
    }
}

/// Decode the session cookie and attach a [`CurrentIdentity`] to the request.
///
/// Never rejects: a missing or invalid cookie just means nobody is signed in.
pub async fn load_identity(
    State(codec): State<SessionCodec>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = read_cookie(request.headers(), SESSION_COOKIE)
        .and_then(|token| codec.decode_identity(&token));
    request.extensions_mut().insert(CurrentIdentity(identity));
    next.run(request).await
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentIdentity>()
            .cloned()
            .unwrap_or_default())
    }
}
