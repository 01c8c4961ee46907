//! Token lifecycle: expiry inspection and refresh.
//!
//! The id token's expiry claim is read without verifying the signature --
//! every privileged call still goes through the identity provider, which
//! verifies it server-side, so no local trust decision rests on the
//! unverified claim.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::remote::IdentityClient;
use crate::session::{Session, SessionStore};

/// Derived token condition. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    Expired,
    Absent,
}

/// Outcome of `ensure_valid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// The session is usable as-is or was refreshed and re-persisted.
    Valid(Session),
    /// No usable credential; route to the login screen.
    LoginRequired,
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Classify an id token against `now`. A missing or undecodable expiry
/// claim counts as expired.
pub fn token_state(id_token: &str, now: DateTime<Utc>) -> TokenState {
    if id_token.is_empty() {
        return TokenState::Absent;
    }
    match decode_exp(id_token) {
        Some(exp) if exp > now.timestamp() => TokenState::Valid,
        _ => TokenState::Expired,
    }
}

fn decode_exp(id_token: &str) -> Option<i64> {
    let payload = id_token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    claims.exp
}

/// Decides whether a held credential is usable, refreshing it when not.
pub struct TokenLifecycle<'a> {
    store: &'a SessionStore,
    identity: &'a IdentityClient,
}

impl<'a> TokenLifecycle<'a> {
    pub fn new(store: &'a SessionStore, identity: &'a IdentityClient) -> Self {
        Self { store, identity }
    }

    /// Ensure the session holds a usable id token.
    ///
    /// - Either token absent: `LoginRequired`, no network call.
    /// - Unexpired: `Valid` with the session unchanged, no network call.
    /// - Expired: one refresh call. Success replaces the token pair and
    ///   persists the session; any failure yields `LoginRequired` and
    ///   leaves the stored session untouched.
    pub async fn ensure_valid(&self, mut session: Session) -> SessionStatus {
        if session.id_token.is_empty() || session.refresh_token.is_empty() {
            return SessionStatus::LoginRequired;
        }
        match token_state(&session.id_token, Utc::now()) {
            TokenState::Valid => SessionStatus::Valid(session),
            _ => {
                tracing::debug!(user_id = %session.user_id, "id token expired, refreshing");
                match self.identity.refresh(&session.refresh_token).await {
                    Ok(tokens) => {
                        session.id_token = tokens.id_token;
                        session.refresh_token = tokens.refresh_token;
                        session.user_id = tokens.user_id;
                        if let Err(e) = self.store.save(&session) {
                            // Best effort: the in-memory session is still
                            // good for this run.
                            tracing::warn!(error = %e, "failed to persist refreshed session");
                        }
                        SessionStatus::Valid(session)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "token refresh failed, login required");
                        SessionStatus::LoginRequired
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fake_id_token(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"sub":"uid-1"}}"#));
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn unexpired_token_is_valid() {
        let now = Utc::now();
        let token = fake_id_token((now + Duration::hours(1)).timestamp());
        assert_eq!(token_state(&token, now), TokenState::Valid);
    }

    #[test]
    fn past_expiry_is_expired() {
        let now = Utc::now();
        let token = fake_id_token((now - Duration::hours(1)).timestamp());
        assert_eq!(token_state(&token, now), TokenState::Expired);
    }

    #[test]
    fn empty_token_is_absent() {
        assert_eq!(token_state("", Utc::now()), TokenState::Absent);
    }

    #[test]
    fn garbage_token_is_expired() {
        assert_eq!(token_state("not-a-jwt", Utc::now()), TokenState::Expired);
        assert_eq!(token_state("a.b.c", Utc::now()), TokenState::Expired);
    }

    #[test]
    fn missing_exp_claim_is_expired() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"uid-1"}"#);
        let token = format!("{header}.{payload}.");
        assert_eq!(token_state(&token, Utc::now()), TokenState::Expired);
    }
}
