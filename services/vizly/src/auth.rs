//! Bearer tokens and the request guard
//!
//! A token is `hex(claims_json).hex(hmac_sha256(secret, hex(claims_json)))`.
//! Access tokens authorise requests; refresh tokens only mint access tokens.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::TokenPair;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub kind: TokenKind,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenSigner {
    pub fn new(secret: &[u8], access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self {
            secret: secret.to_vec(),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn issue(&self, sub: &str, kind: TokenKind) -> String {
        self.issue_at(sub, kind, now())
    }

    pub fn issue_pair(&self, sub: &str) -> TokenPair {
        TokenPair {
            access: self.issue(sub, TokenKind::Access),
            refresh: self.issue(sub, TokenKind::Refresh),
        }
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, ApiError> {
        self.verify_at(token, kind, now())
    }

    fn issue_at(&self, sub: &str, kind: TokenKind, now: u64) -> String {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        let claims = Claims {
            sub: sub.to_string(),
            kind,
            iat: now,
            exp: now + ttl,
        };
        // Claims has no map keys or floats, serialization cannot fail
        let payload = hex::encode(serde_json::to_vec(&claims).unwrap_or_default());

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());

        format!("{payload}.{sig}")
    }

    fn verify_at(&self, token: &str, kind: TokenKind, now: u64) -> Result<Claims, ApiError> {
        let (payload, sig) = token.split_once('.').ok_or(ApiError::InvalidToken)?;
        let sig = hex::decode(sig).map_err(|_| ApiError::InvalidToken)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig).map_err(|_| ApiError::InvalidToken)?;

        let json = hex::decode(payload).map_err(|_| ApiError::InvalidToken)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| ApiError::InvalidToken)?;

        if claims.kind != kind || claims.exp <= now {
            return Err(ApiError::InvalidToken);
        }
        Ok(claims)
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take any key length")
    }
}

/// Compare credentials by BLAKE3 digest; `blake3::Hash` equality is
/// constant time.
pub fn credentials_match(username: &str, password: &str, want_user: &str, want_pass: &str) -> bool {
    let user_ok = blake3::hash(username.as_bytes()) == blake3::hash(want_user.as_bytes());
    let pass_ok = blake3::hash(password.as_bytes()) == blake3::hash(want_pass.as_bytes());
    user_ok & pass_ok
}

fn now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Authenticated caller, extracted from `Authorization: Bearer <access>`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
}

#[async_trait]
impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(ApiError::Unauthenticated)?;
        let value = header.to_str().map_err(|_| ApiError::InvalidToken)?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthenticated)?;

        let claims = state.tokens.verify(token.trim(), TokenKind::Access)?;
        Ok(AuthUser { username: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-secret", 60, 600)
    }

    #[test]
    fn access_token_round_trip() {
        let s = signer();
        let token = s.issue_at("alice", TokenKind::Access, 1_000);
        let claims = s.verify_at(&token, TokenKind::Access, 1_010).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp, 1_060);
    }

    #[test]
    fn expired_token_rejected() {
        let s = signer();
        let token = s.issue_at("alice", TokenKind::Access, 1_000);
        assert!(matches!(
            s.verify_at(&token, TokenKind::Access, 1_060),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let s = signer();
        let token = s.issue_at("alice", TokenKind::Refresh, 1_000);
        assert!(s.verify_at(&token, TokenKind::Access, 1_001).is_err());
        assert!(s.verify_at(&token, TokenKind::Refresh, 1_599).is_ok());
    }

    #[test]
    fn tampered_payload_rejected() {
        let s = signer();
        let token = s.issue_at("alice", TokenKind::Access, 1_000);
        let (_, sig) = token.split_once('.').unwrap();

        let forged = Claims {
            sub: "mallory".into(),
            kind: TokenKind::Access,
            iat: 1_000,
            exp: 9_999_999,
        };
        let forged = format!("{}.{sig}", hex::encode(serde_json::to_vec(&forged).unwrap()));
        assert!(s.verify_at(&forged, TokenKind::Access, 1_001).is_err());
    }

    #[test]
    fn other_secret_rejected() {
        let token = signer().issue_at("alice", TokenKind::Access, 1_000);
        let other = TokenSigner::new(b"other-secret", 60, 600);
        assert!(other.verify_at(&token, TokenKind::Access, 1_001).is_err());
    }

    #[test]
    fn garbage_rejected() {
        let s = signer();
        assert!(s.verify_at("", TokenKind::Access, 0).is_err());
        assert!(s.verify_at("abc", TokenKind::Access, 0).is_err());
        assert!(s.verify_at("zz.zz", TokenKind::Access, 0).is_err());
    }

    #[test]
    fn credentials() {
        assert!(credentials_match("admin", "pw", "admin", "pw"));
        assert!(!credentials_match("admin", "nope", "admin", "pw"));
        assert!(!credentials_match("root", "pw", "admin", "pw"));
    }
}
