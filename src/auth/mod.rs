//! Sign-in and sessions
//!
//! - `oauth`: the identity provider handshake
//! - `session`: signed cookies holding the session identity and sign-in state
//! - `middleware`: attaches the current identity to each request

pub mod middleware;
pub mod oauth;
pub mod session;

pub use middleware::{load_identity, CurrentIdentity};
pub use oauth::{Auth0Provider, AuthError, IdentityProvider};
pub use session::{read_cookie, SessionCodec, SESSION_COOKIE, STATE_COOKIE};
