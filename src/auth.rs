//! Session gating for dashboard routes.
//!
//! Authentication itself is delegated to an external provider; the core
//! only ever asks "is there a session for this token". The provider
//! contract is a trait so tests (and alternate deployments) can swap the
//! implementation without touching handlers.

use crate::api::envelope::ApiErrorResponse;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Response;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::watch;

/// An authenticated session, as reported by the provider.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
}

/// Password credentials for delegated sign-in/sign-up.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Provider-side failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("operation not supported by this provider: {0}")]
    Unsupported(&'static str),

    #[error("auth provider error: {0}")]
    Provider(String),
}

/// External authentication collaborator contract.
///
/// Mirrors the delegated provider surface: session retrieval, the three
/// sign-in flavors, sign-out, and a change-notification subscription.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolve a bearer token to a live session, if any.
    async fn get_session(&self, token: &str) -> Option<Session>;

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Begin an OAuth flow; returns the redirect URL.
    async fn sign_in_with_oauth(&self, provider: &str) -> Result<String, AuthError>;

    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    /// Subscribe to session-change notifications (latest session or None).
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// Token-list provider for deployments where sessions are issued out of
/// band (and for tests). Sign-in flows stay with the external service;
/// this implementation only validates and revokes known tokens.
pub struct StaticSessionProvider {
    sessions: RwLock<HashMap<String, Session>>,
    changes: watch::Sender<Option<Session>>,
}

impl StaticSessionProvider {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sessions: HashMap<String, Session> = tokens
            .into_iter()
            .map(Into::into)
            .filter(|t| !t.is_empty())
            .enumerate()
            .map(|(i, token)| {
                (
                    token,
                    Session {
                        user_id: format!("local-{}", i + 1),
                        email: None,
                    },
                )
            })
            .collect();

        let (changes, _) = watch::channel(None);
        Self {
            sessions: RwLock::new(sessions),
            changes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().map(|s| s.is_empty()).unwrap_or(true)
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn get_session(&self, token: &str) -> Option<Session> {
        self.sessions.read().ok()?.get(token).cloned()
    }

    async fn sign_in_with_password(&self, _credentials: &Credentials) -> Result<Session, AuthError> {
        Err(AuthError::Unsupported("password sign-in is delegated to the external provider"))
    }

    async fn sign_up(&self, _credentials: &Credentials) -> Result<Session, AuthError> {
        Err(AuthError::Unsupported("sign-up is delegated to the external provider"))
    }

    async fn sign_in_with_oauth(&self, _provider: &str) -> Result<String, AuthError> {
        Err(AuthError::Unsupported("OAuth is delegated to the external provider"))
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        sessions.remove(token);
        let _ = self.changes.send(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.changes.subscribe()
    }
}

/// Extract Bearer token from Authorization header.
fn extract_bearer(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Authenticated-request extractor for dashboard routes.
pub struct SessionAuth {
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<crate::api::DashboardState> for SessionAuth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::api::DashboardState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts)
            .ok_or_else(|| ApiErrorResponse::unauthorized("Missing Bearer token"))?;

        let session = state
            .sessions
            .get_session(&token)
            .await
            .ok_or_else(|| ApiErrorResponse::unauthorized("No active session"))?;

        Ok(SessionAuth { session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_resolves_to_a_session() {
        let provider = StaticSessionProvider::new(["operator-token"]);
        assert!(provider.get_session("operator-token").await.is_some());
        assert!(provider.get_session("other").await.is_none());
    }

    #[tokio::test]
    async fn sign_out_revokes_the_token() {
        let provider = StaticSessionProvider::new(["t1"]);
        provider.sign_out("t1").await.unwrap();
        assert!(provider.get_session("t1").await.is_none());
    }

    #[tokio::test]
    async fn delegated_flows_are_unsupported() {
        let provider = StaticSessionProvider::new(["t1"]);
        let creds = Credentials {
            email: "a@b.c".into(),
            password: "pw".into(),
        };
        assert!(matches!(
            provider.sign_in_with_password(&creds).await,
            Err(AuthError::Unsupported(_))
        ));
        assert!(matches!(
            provider.sign_in_with_oauth("github").await,
            Err(AuthError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn sign_out_notifies_subscribers() {
        let provider = StaticSessionProvider::new(["t1"]);
        let mut rx = provider.subscribe();
        provider.sign_out("t1").await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn empty_tokens_are_ignored() {
        let provider = StaticSessionProvider::new(["", "t"]);
        assert!(!provider.is_empty());
        let provider = StaticSessionProvider::new(Vec::<String>::new());
        assert!(provider.is_empty());
    }
}
