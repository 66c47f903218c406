//! Session tokens and request authentication.
//!
//! ## Flow
//! ```text
//! POST /api/login ──► UserRepository::authenticate ──► SessionStore::create
//!                                                          │
//!                                          token ◄─────────┘
//!
//! GET /api/history
//!   Authorization: Bearer <token>
//!        │
//!        ▼
//!   AuthorizedUser extractor ──► SessionStore::resolve ──► handler
//!        │ (missing / unknown / expired)
//!        ▼
//!   401 UNAUTHENTICATED
//! ```
//!
//! Manager routes take [`ManagerUser`], which additionally rejects customers
//! with 403.

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{async_trait, RequestPartsExt};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use bookstore_core::{Account, UserRole};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Session Store
// =============================================================================

/// An authenticated session bound to a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Issues, resolves and revokes bearer tokens.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a session for the account and returns its token. Expired
    /// sessions are purged as a side effect.
    async fn create(&self, account: &Account) -> String;

    /// Looks up a live session. Expired sessions are dropped and yield `None`.
    async fn resolve(&self, token: &str) -> Option<Session>;

    /// Removes a session. Returns false if the token was unknown.
    async fn revoke(&self, token: &str) -> bool;
}

/// Process-local session store. Sessions do not survive a restart.
pub struct InMemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        InMemorySessionStore {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, account: &Account) -> String {
        let now = Utc::now();
        let token = Uuid::new_v4().simple().to_string();
        let session = Session {
            user_id: account.id,
            username: account.username.clone(),
            role: account.role,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        // Tokens that are never presented again are only reclaimed here.
        sessions.retain(|_, s| !s.is_expired(now));
        let purged = before - sessions.len();
        sessions.insert(token.clone(), session);
        drop(sessions);

        debug!(user_id = account.id, purged, "Session created");
        token
    }

    async fn resolve(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return None,
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
            }
        }

        self.sessions.write().await.remove(token);
        debug!("Expired session dropped");
        None
    }

    async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// The caller behind a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    pub token: String,
    pub session: Session,
}

impl AuthorizedUser {
    pub fn id(&self) -> i64 {
        self.session.user_id
    }

    pub fn is_manager(&self) -> bool {
        self.session.role == UserRole::Manager
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthorizedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::Unauthenticated)?;
        let token = bearer.token().to_string();

        let session = state
            .sessions
            .resolve(&token)
            .await
            .ok_or(ApiError::Unauthenticated)?;

        Ok(AuthorizedUser { token, session })
    }
}

/// An authorized caller holding the manager role.
#[derive(Debug, Clone)]
pub struct ManagerUser(pub AuthorizedUser);

#[async_trait]
impl FromRequestParts<AppState> for ManagerUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthorizedUser::from_request_parts(parts, state).await?;
        if !user.is_manager() {
            debug!(user_id = user.id(), "Customer rejected from manager route");
            return Err(ApiError::Forbidden);
        }
        Ok(ManagerUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: UserRole) -> Account {
        Account {
            id: 7,
            username: "ann".to_string(),
            email: "ann@example.com".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let store = InMemorySessionStore::new(Duration::hours(1));
        let token = store.create(&account(UserRole::Manager)).await;

        let session = store.resolve(&token).await.unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.role, UserRole::Manager);
        assert!(store.resolve("unknown").await.is_none());
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = InMemorySessionStore::new(Duration::hours(1));
        let a = store.create(&account(UserRole::Customer)).await;
        let b = store.create(&account(UserRole::Customer)).await;
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_revoke() {
        let store = InMemorySessionStore::new(Duration::hours(1));
        let token = store.create(&account(UserRole::Customer)).await;

        assert!(store.revoke(&token).await);
        assert!(!store.revoke(&token).await);
        assert!(store.resolve(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let store = InMemorySessionStore::new(Duration::seconds(-1));
        let token = store.create(&account(UserRole::Customer)).await;

        assert!(store.resolve(&token).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_create_purges_abandoned_sessions() {
        let store = InMemorySessionStore::new(Duration::seconds(-1));
        for _ in 0..5 {
            store.create(&account(UserRole::Customer)).await;
        }

        // Only the newest (already expired) entry remains.
        assert_eq!(store.len().await, 1);
    }
}
