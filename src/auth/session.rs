//! Signed cookie sessions
//!
//! A cookie value is `base64url(json) "." base64url(hmac_sha256(json))`. The
//! JSON envelope carries an absolute expiry; anything that fails to verify,
//! fails to parse or has expired reads back as `None`.

use anyhow::{Context, Result};
use axum::http::{header, HeaderMap};
use chrono::Utc;
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;

use crate::config::SessionConfig;
use crate::models::SessionIdentity;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "session";
pub const STATE_COOKIE: &str = "oauth_state";

/// How long a sign-in round trip may take
pub const STATE_MAX_AGE_SECONDS: i64 = 10 * 60;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    exp: i64,
    data: T,
}

#[derive(Clone)]
pub struct SessionCodec {
    key: Vec<u8>,
    max_age_seconds: i64,
    secure: bool,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("max_age_seconds", &self.max_age_seconds)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            key: config.secret.as_bytes().to_vec(),
            max_age_seconds: config.max_age_seconds,
            secure: config.secure_cookie,
        }
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key).context("Invalid session signing key")
    }

    fn sign_until<T: Serialize>(&self, value: &T, exp: i64) -> Result<String> {
        let payload = serde_json::to_vec(&Envelope { exp, data: value })
            .context("Failed to serialize session payload")?;
        let mut mac = self.mac()?;
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();
        Ok(format!(
            "{}.{}",
            BASE64URL_NOPAD.encode(&payload),
            BASE64URL_NOPAD.encode(&signature)
        ))
    }

    fn verify_at<T: DeserializeOwned>(&self, token: &str, now: i64) -> Option<T> {
        let (payload, signature) = token.split_once('.')?;
        let payload = BASE64URL_NOPAD.decode(payload.as_bytes()).ok()?;
        let signature = BASE64URL_NOPAD.decode(signature.as_bytes()).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(&payload);
        if mac.verify_slice(&signature).is_err() {
            tracing::warn!("Rejected cookie with bad signature");
            return None;
        }

        let envelope: Envelope<T> = serde_json::from_slice(&payload).ok()?;
        if envelope.exp <= now {
            tracing::debug!("Ignoring expired cookie");
            return None;
        }
        Some(envelope.data)
    }

    /// Sign `value` so that it verifies for `ttl_seconds` from now
    pub fn sign<T: Serialize>(&self, value: &T, ttl_seconds: i64) -> Result<String> {
        self.sign_until(value, Utc::now().timestamp() + ttl_seconds)
    }

    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Option<T> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn encode_identity(&self, identity: &SessionIdentity) -> Result<String> {
        self.sign(identity, self.max_age_seconds)
    }

    pub fn decode_identity(&self, token: &str) -> Option<SessionIdentity> {
        self.verify(token)
    }

    /// `Set-Cookie` value carrying a signed session
    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie(SESSION_COOKIE, token, self.max_age_seconds)
    }

    /// `Set-Cookie` value carrying a signed OAuth state
    pub fn state_cookie(&self, token: &str) -> String {
        self.cookie(STATE_COOKIE, token, STATE_MAX_AGE_SECONDS)
    }

    /// `Set-Cookie` value that removes `name`
    pub fn clear_cookie(&self, name: &str) -> String {
        self.cookie(name, "", 0)
    }

    fn cookie(&self, name: &str, value: &str, max_age: i64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
            name, value, max_age, secure
        )
    }
}

/// Read a cookie value from request headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    fn codec(secret: &str) -> SessionCodec {
        SessionCodec::new(&SessionConfig {
            secret: secret.to_string(),
            max_age_seconds: 3600,
            secure_cookie: false,
        })
    }

    fn identity() -> SessionIdentity {
        SessionIdentity::new("github|42", "Alice", "https://avatars.example/42")
    }

    #[test]
    fn test_identity_roundtrip() {
        let codec = codec("secret");
        let token = codec.encode_identity(&identity()).unwrap();
        assert_eq!(codec.decode_identity(&token), Some(identity()));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = codec("one").encode_identity(&identity()).unwrap();
        assert!(codec("two").decode_identity(&token).is_none());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec("secret");
        let token = codec.encode_identity(&identity()).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged = SessionIdentity::new("github|1", "Mallory", "");
        let payload = serde_json::to_vec(&Envelope {
            exp: Utc::now().timestamp() + 3600,
            data: &forged,
        })
        .unwrap();
        let tampered = format!("{}.{}", BASE64URL_NOPAD.encode(&payload), signature);

        assert!(codec.decode_identity(&tampered).is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec("secret");
        let token = codec.sign_until(&identity(), 1_000).unwrap();

        assert!(codec.verify_at::<SessionIdentity>(&token, 999).is_some());
        assert!(codec.verify_at::<SessionIdentity>(&token, 1_000).is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = codec("secret");
        for token in ["", ".", "abc", "abc.def", "!!!.???", "a.b.c"] {
            assert!(codec.decode_identity(token).is_none(), "accepted {:?}", token);
        }
    }

    #[test]
    fn test_cookie_attributes() {
        let plain = codec("secret").session_cookie("tok");
        assert_eq!(plain, "session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600");

        let secure = SessionCodec::new(&SessionConfig {
            secret: "s".to_string(),
            max_age_seconds: 60,
            secure_cookie: true,
        });
        assert!(secure.state_cookie("x").ends_with("; Secure"));
        assert!(secure.clear_cookie(SESSION_COOKIE).contains("Max-Age=0"));
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc.def; oauth_state="),
        );

        assert_eq!(read_cookie(&headers, SESSION_COOKIE).as_deref(), Some("abc.def"));
        assert_eq!(read_cookie(&headers, STATE_COOKIE), None);
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn signed_values_verify_under_same_key(
            secret in "[a-zA-Z0-9]{1,32}",
            sub in "[a-z]{1,8}\\|[0-9]{1,10}",
            name in ".{0,40}",
        ) {
            let codec = codec(&secret);
            let identity = SessionIdentity::new(sub, name, "");
            let token = codec.encode_identity(&identity).unwrap();
            prop_assert_eq!(codec.decode_identity(&token), Some(identity));
        }

        #[test]
        fn flipping_a_signature_byte_invalidates(secret in "[a-z]{1,16}", idx in 0usize..32) {
            let codec = codec(&secret);
            let token = codec.encode_identity(&identity()).unwrap();
            let (payload, signature) = token.split_once('.').unwrap();
            let mut raw = BASE64URL_NOPAD.decode(signature.as_bytes()).unwrap();
            raw[idx] ^= 0x01;
            let tampered = format!("{}.{}", payload, BASE64URL_NOPAD.encode(&raw));
            prop_assert!(codec.decode_identity(&tampered).is_none());
        }
    }
}
