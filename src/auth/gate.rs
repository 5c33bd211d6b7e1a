//! Per-call authentication and quota gate.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::credentials::{CredentialStore, InMemoryCredentialStore};
use crate::config::GatekeeperConfig;
use crate::error::{GatekeeperError, Result};
use crate::ratelimit::{Decision, RateLimiter};
use crate::token::{SigningKey, Token, TokenCodec, VerifyError};

/// Scheme prefix accepted in front of the token.
const BEARER_PREFIX: &str = "Bearer ";

/// Why a call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingCredential,
    InvalidCredential,
    ExpiredCredential,
    RateLimited,
}

impl From<VerifyError> for RejectReason {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Invalid => RejectReason::InvalidCredential,
            VerifyError::Expired => RejectReason::ExpiredCredential,
        }
    }
}

/// Outcome of gating one inbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Authenticated { identity: String },
    Rejected { reason: RejectReason },
}

impl AuthResult {
    fn rejected(reason: RejectReason) -> Self {
        AuthResult::Rejected { reason }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthResult::Authenticated { .. })
    }
}

/// Identity resolved by the gate, attached to the call context of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity(pub String);

impl AuthenticatedIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Verifies tokens and charges the per-identity quota.
///
/// Cheap to clone; clones share the same rate limiter and credential store.
#[derive(Clone)]
pub struct AuthGate {
    codec: TokenCodec,
    limiter: Arc<RateLimiter>,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthGate {
    pub fn new(
        codec: TokenCodec,
        limiter: Arc<RateLimiter>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            codec,
            limiter,
            credentials,
        }
    }

    /// Build a gate from validated configuration, using the configured user
    /// table as the credential store.
    pub fn from_config(config: &GatekeeperConfig) -> Result<Self> {
        config.validate()?;

        let key = SigningKey::new(config.auth.secret_key.as_bytes())?;
        let codec = TokenCodec::new(key, secs(config.auth.token_max_age_secs)?);
        let limiter = RateLimiter::new(
            config.rate_limiting.limit,
            secs(config.rate_limiting.interval_secs)?,
        )?;
        let credentials: InMemoryCredentialStore = config
            .users
            .iter()
            .map(|user| (user.identity.clone(), user.secret.clone()))
            .collect();

        info!(
            users = credentials.len(),
            limit = config.rate_limiting.limit,
            interval_secs = config.rate_limiting.interval_secs,
            token_max_age_secs = config.auth.token_max_age_secs,
            "Auth gate initialized"
        );

        Ok(Self::new(codec, Arc::new(limiter), Arc::new(credentials)))
    }

    /// Gate one call presenting `raw_credential` at `now`.
    ///
    /// The token is verified before the limiter is consulted, so callers
    /// without a valid token never consume anyone's quota.
    pub fn authenticate(&self, raw_credential: Option<&str>, now: DateTime<Utc>) -> AuthResult {
        let Some(token) = raw_credential.and_then(extract_token) else {
            warn!("Token is missing");
            return AuthResult::rejected(RejectReason::MissingCredential);
        };

        let identity = match self.codec.verify(token, now) {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "Token verification failed");
                return AuthResult::rejected(err.into());
            }
        };

        match self.limiter.check_and_record(&identity, now) {
            Decision::Admit => {
                debug!(identity = %identity, "Call authenticated");
                AuthResult::Authenticated { identity }
            }
            Decision::Reject => {
                warn!(identity = %identity, "Rate limit exceeded");
                AuthResult::rejected(RejectReason::RateLimited)
            }
        }
    }

    /// Check `{identity, secret}` against the credential store and issue a
    /// token on match.
    pub async fn login(&self, identity: &str, secret: &str, now: DateTime<Utc>) -> Option<Token> {
        if !self.credentials.verify(identity, secret).await {
            warn!(identity = %identity, "Login rejected");
            return None;
        }

        info!(identity = %identity, "Login succeeded, issuing token");
        Some(self.codec.issue(identity, now))
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("codec", &self.codec)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

fn secs(value: u64) -> Result<Duration> {
    i64::try_from(value)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| GatekeeperError::Config(format!("duration of {} seconds is out of range", value)))
}

/// Pull the token out of a credential field, accepting both the bare token
/// and the `Bearer <token>` form. Blank values count as absent.
fn extract_token(raw: &str) -> Option<&str> {
    let raw = raw.trim_start();
    let token = match raw.get(..BEARER_PREFIX.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER_PREFIX) => {
            raw[BEARER_PREFIX.len()..].trim()
        }
        _ => raw.trim(),
    };
    (!token.is_empty()).then_some(token)
}
