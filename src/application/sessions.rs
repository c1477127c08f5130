//! Admin sessions: password login, hashed server-side tokens and per-request authentication.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::repos::{CreateSessionParams, RepoError, SessionsRepo};

const TOKEN_PREFIX: &str = "ps";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("admin login is disabled")]
    LoginDisabled,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("session lifetime of {0:?} is out of range")]
    TtlOutOfRange(Duration),
}

#[derive(Debug, Error)]
pub enum AdminAuthError {
    #[error("missing admin session")]
    Missing,
    #[error("invalid admin session")]
    Invalid,
    #[error("expired admin session")]
    Expired,
    #[error("session lookup failed: {0}")]
    Lookup(RepoError),
}

/// Proof that the current request carries a valid admin session.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub session_id: Uuid,
    pub prefix: String,
}

impl AdminPrincipal {
    pub fn actor(&self) -> String {
        format!("session:{}", self.prefix)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AdminSessionService {
    repo: Arc<dyn SessionsRepo>,
    password_digest: Option<Vec<u8>>,
    ttl: Duration,
}

impl AdminSessionService {
    /// `password` of `None` disables login entirely.
    pub fn new(repo: Arc<dyn SessionsRepo>, password: Option<&str>, ttl: Duration) -> Self {
        Self {
            repo,
            password_digest: password.map(Self::hash_secret),
            ttl,
        }
    }

    pub fn login_enabled(&self) -> bool {
        self.password_digest.is_some()
    }

    pub async fn login(&self, password: &str) -> Result<IssuedSession, SessionError> {
        let expected = self
            .password_digest
            .as_ref()
            .ok_or(SessionError::LoginDisabled)?;

        let supplied = Self::hash_secret(password);
        if expected.ct_eq(&supplied).unwrap_u8() == 0 {
            counter!("postdesk_admin_logins_total", "outcome" => "rejected").increment(1);
            warn!(target = "postdesk::sessions", "rejected admin login attempt");
            return Err(SessionError::InvalidCredentials);
        }

        let now = OffsetDateTime::now_utc();
        match self.repo.purge_expired(now).await {
            Ok(purged) if purged > 0 => {
                info!(target = "postdesk::sessions", purged, "purged expired sessions");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(
                    target = "postdesk::sessions",
                    error = %err,
                    "failed to purge expired sessions"
                );
            }
        }

        let prefix = Self::generate_prefix();
        let secret = Self::generate_secret();
        let expires_at = time::Duration::try_from(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or(SessionError::TtlOutOfRange(self.ttl))?;

        let record = self
            .repo
            .create_session(CreateSessionParams {
                prefix: prefix.clone(),
                hashed_secret: Self::hash_secret(&secret),
                expires_at,
            })
            .await?;

        counter!("postdesk_admin_logins_total", "outcome" => "accepted").increment(1);
        info!(
            target = "postdesk::sessions",
            session_id = %record.id,
            prefix = %record.prefix,
            "admin session issued"
        );

        Ok(IssuedSession {
            token: format!("{TOKEN_PREFIX}_{prefix}_{secret}"),
            expires_at: record.expires_at,
        })
    }

    pub async fn authenticate(&self, token: &str) -> Result<AdminPrincipal, AdminAuthError> {
        if token.is_empty() {
            return Err(AdminAuthError::Missing);
        }
        let parsed = Self::parse_token(token).ok_or(AdminAuthError::Invalid)?;
        let record = self
            .repo
            .find_by_prefix(&parsed.prefix)
            .await
            .map_err(AdminAuthError::Lookup)?
            .ok_or(AdminAuthError::Invalid)?;

        if record.is_expired_at(OffsetDateTime::now_utc()) {
            return Err(AdminAuthError::Expired);
        }

        let hashed_input = Self::hash_secret(&parsed.secret);
        if record.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AdminAuthError::Invalid);
        }

        Ok(AdminPrincipal {
            session_id: record.id,
            prefix: record.prefix,
        })
    }

    /// Malformed tokens have nothing to revoke and are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), SessionError> {
        let Some(parsed) = Self::parse_token(token) else {
            return Ok(());
        };
        self.repo.delete_by_prefix(&parsed.prefix).await?;
        info!(target = "postdesk::sessions", prefix = %parsed.prefix, "admin session closed");
        Ok(())
    }

    fn hash_secret(secret: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.finalize().to_vec()
    }

    fn generate_prefix() -> String {
        Uuid::new_v4().simple().to_string()[..12].to_string()
    }

    fn generate_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn parse_token(token: &str) -> Option<ParsedToken> {
        let mut parts = token.splitn(3, '_');
        if parts.next()? != TOKEN_PREFIX {
            return None;
        }
        let prefix = parts.next()?;
        let secret = parts.next()?;
        if secret.len() < MIN_SECRET_LEN || prefix.is_empty() {
            return None;
        }
        Some(ParsedToken {
            prefix: prefix.to_string(),
            secret: secret.to_string(),
        })
    }
}

struct ParsedToken {
    prefix: String,
    secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryRepositories;

    fn service(password: Option<&str>, ttl: Duration) -> AdminSessionService {
        let repo = Arc::new(InMemoryRepositories::new());
        AdminSessionService::new(repo, password, ttl)
    }

    #[tokio::test]
    async fn login_then_authenticate_round_trips() {
        let sessions = service(Some("hunter2"), Duration::from_secs(60));
        let issued = sessions.login("hunter2").await.expect("login succeeds");

        let principal = sessions
            .authenticate(&issued.token)
            .await
            .expect("token authenticates");
        assert!(issued.token.contains(&principal.prefix));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let sessions = service(Some("hunter2"), Duration::from_secs(60));
        let err = sessions.login("hunter3").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_is_disabled_without_password() {
        let sessions = service(None, Duration::from_secs(60));
        assert!(!sessions.login_enabled());
        assert!(matches!(
            sessions.login("").await.unwrap_err(),
            SessionError::LoginDisabled
        ));
    }

    #[tokio::test]
    async fn tampered_secret_is_invalid() {
        let sessions = service(Some("pw"), Duration::from_secs(60));
        let issued = sessions.login("pw").await.unwrap();
        // secrets are hex, so `x` always differs
        let mut tampered = issued.token.clone();
        tampered.pop();
        tampered.push('x');

        assert!(matches!(
            sessions.authenticate(&tampered).await.unwrap_err(),
            AdminAuthError::Invalid
        ));
    }

    #[tokio::test]
    async fn empty_token_is_missing() {
        let sessions = service(Some("pw"), Duration::from_secs(60));
        assert!(matches!(
            sessions.authenticate("").await.unwrap_err(),
            AdminAuthError::Missing
        ));
    }

    #[tokio::test]
    async fn oversized_ttl_fails_login_instead_of_panicking() {
        let sessions = service(Some("pw"), Duration::from_secs(u64::MAX / 2));
        assert!(matches!(
            sessions.login("pw").await.unwrap_err(),
            SessionError::TtlOutOfRange(_)
        ));
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let sessions = service(Some("pw"), Duration::ZERO);
        let issued = sessions.login("pw").await.unwrap();

        assert!(matches!(
            sessions.authenticate(&issued.token).await.unwrap_err(),
            AdminAuthError::Expired
        ));
    }

    #[tokio::test]
    async fn logout_revokes_token() {
        let sessions = service(Some("pw"), Duration::from_secs(60));
        let issued = sessions.login("pw").await.unwrap();
        sessions.logout(&issued.token).await.unwrap();

        assert!(matches!(
            sessions.authenticate(&issued.token).await.unwrap_err(),
            AdminAuthError::Invalid
        ));
    }

    #[tokio::test]
    async fn malformed_tokens_never_reach_the_repository() {
        let sessions = service(Some("pw"), Duration::from_secs(60));
        for token in ["ps", "ps_abc_short", "sk_abc_0123456789abcdef0123456789abcdef"] {
            assert!(matches!(
                sessions.authenticate(token).await.unwrap_err(),
                AdminAuthError::Invalid
            ));
        }
    }
}
