//! Server-side sessions.
//!
//! A session is a random v4 UUID handed to the browser in the `hms_session` cookie. The record
//! behind it holds who is logged in (as a [`PrincipalRef`], never a role tag) and the flash
//! messages queued for the next page. Anonymous visitors get a session the first time a flash is
//! queued for them so the message survives the redirect.
//!
//! Records idle for longer than the store's timeout are dropped when next touched or when a new
//! session is admitted, and the table never holds more than its capacity.

use hms_core::PrincipalRef;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "hms_session";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Danger,
}

/// A one-shot message shown on the next rendered view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct Flash {
    pub severity: Severity,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Danger,
            message: message.into(),
        }
    }
}

/// Idle time after which a session is discarded.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Most sessions held at once. Beyond this the least recently seen anonymous session goes
/// first, then the least recently seen logged-in one.
pub const MAX_SESSIONS: usize = 10_000;

#[derive(Clone, Debug)]
struct SessionRecord {
    principal: Option<PrincipalRef>,
    flashes: Vec<Flash>,
    last_seen: Instant,
}

impl SessionRecord {
    fn new(principal: Option<PrincipalRef>, flashes: Vec<Flash>) -> Self {
        Self {
            principal,
            flashes,
            last_seen: Instant::now(),
        }
    }
}

type SessionMap = HashMap<Uuid, SessionRecord>;

/// In-memory session table shared by every request handler.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<SessionMap>>,
    idle_timeout: Duration,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(SESSION_IDLE_TIMEOUT, MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, capacity: usize) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
            capacity: capacity.max(1),
        }
    }

    fn expired(&self, record: &SessionRecord, now: Instant) -> bool {
        now.duration_since(record.last_seen) >= self.idle_timeout
    }

    /// The live record behind `token`, marked as seen. An idle record is dropped instead.
    fn touch<'a>(
        &self,
        sessions: &'a mut SessionMap,
        token: Uuid,
    ) -> Option<&'a mut SessionRecord> {
        let now = Instant::now();
        if sessions.get(&token).is_some_and(|r| self.expired(r, now)) {
            sessions.remove(&token);
            tracing::debug!("session expired");
            return None;
        }
        let record = sessions.get_mut(&token)?;
        record.last_seen = now;
        Some(record)
    }

    /// Inserts a new record after sweeping idle sessions and making room under the cap.
    fn admit(&self, sessions: &mut SessionMap, token: Uuid, record: SessionRecord) {
        let now = Instant::now();
        sessions.retain(|_, r| !self.expired(r, now));
        while sessions.len() >= self.capacity {
            let Some(victim) = sessions
                .iter()
                .min_by_key(|(_, r)| (r.principal.is_some(), r.last_seen))
                .map(|(token, _)| *token)
            else {
                break;
            };
            sessions.remove(&victim);
        }
        sessions.insert(token, record);
    }

    /// Starts an authenticated session and returns its token.
    ///
    /// Any session the browser already had is discarded so a token issued before login is never
    /// promoted to an authenticated one.
    pub async fn login(&self, previous: Option<Uuid>, principal: PrincipalRef) -> Uuid {
        let token = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        if let Some(old) = previous {
            sessions.remove(&old);
        }
        self.admit(
            &mut sessions,
            token,
            SessionRecord::new(Some(principal), Vec::new()),
        );
        tracing::debug!("session started for {principal:?}");
        token
    }

    pub async fn logout(&self, token: Uuid) {
        self.sessions.write().await.remove(&token);
    }

    /// The principal a session refers to, if the token is live and logged in.
    pub async fn principal(&self, token: Uuid) -> Option<PrincipalRef> {
        let mut sessions = self.sessions.write().await;
        self.touch(&mut sessions, token)
            .and_then(|record| record.principal)
    }

    /// Drops the login from a session while keeping its pending flashes.
    pub async fn forget_principal(&self, token: Uuid) {
        if let Some(record) = self.sessions.write().await.get_mut(&token) {
            record.principal = None;
        }
    }

    /// Queues a flash. When `token` is unknown, idle or absent a fresh anonymous session is
    /// created; its token is returned so the caller can set the cookie.
    pub async fn push_flash(&self, token: Option<Uuid>, flash: Flash) -> Option<Uuid> {
        let mut sessions = self.sessions.write().await;
        let existing = match token {
            Some(token) => self.touch(&mut sessions, token),
            None => None,
        };
        if let Some(record) = existing {
            record.flashes.push(flash);
            return None;
        }

        let fresh = Uuid::new_v4();
        self.admit(&mut sessions, fresh, SessionRecord::new(None, vec![flash]));
        Some(fresh)
    }

    /// Removes and returns every queued flash.
    pub async fn take_flashes(&self, token: Option<Uuid>) -> Vec<Flash> {
        let Some(token) = token else {
            return Vec::new();
        };
        let mut sessions = self.sessions.write().await;
        self.touch(&mut sessions, token)
            .map(|record| std::mem::take(&mut record.flashes))
            .unwrap_or_default()
    }

    /// Number of sessions currently held, idle ones included until the next sweep.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Extracts the session token from a `Cookie` header value.
pub fn token_from_cookie_header(header: &str) -> Option<Uuid> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value establishing `token`.
pub fn session_cookie(token: Uuid) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_core::ids::PatientId;

    #[tokio::test]
    async fn test_login_replaces_previous_session() {
        let store = SessionStore::new();
        let anonymous = store
            .push_flash(None, Flash::danger("Unauthorized access"))
            .await
            .expect("anonymous session should be created");

        let token = store
            .login(Some(anonymous), PrincipalRef::Patient(PatientId(1)))
            .await;
        assert_ne!(token, anonymous);
        assert_eq!(store.principal(anonymous).await, None);
        assert_eq!(
            store.principal(token).await,
            Some(PrincipalRef::Patient(PatientId(1)))
        );
    }

    #[tokio::test]
    async fn test_flashes_are_drained_once() {
        let store = SessionStore::new();
        let token = store.login(None, PrincipalRef::Patient(PatientId(2))).await;

        assert_eq!(store.push_flash(Some(token), Flash::success("one")).await, None);
        store.push_flash(Some(token), Flash::danger("two")).await;

        let flashes = store.take_flashes(Some(token)).await;
        assert_eq!(flashes, vec![Flash::success("one"), Flash::danger("two")]);
        assert!(store.take_flashes(Some(token)).await.is_empty());
    }

    #[tokio::test]
    async fn test_logout_and_forget() {
        let store = SessionStore::new();
        let token = store.login(None, PrincipalRef::Patient(PatientId(3))).await;
        store.push_flash(Some(token), Flash::danger("bye")).await;

        store.forget_principal(token).await;
        assert_eq!(store.principal(token).await, None);
        assert_eq!(store.take_flashes(Some(token)).await.len(), 1);

        store.logout(token).await;
        assert!(store.push_flash(Some(token), Flash::success("x")).await.is_some());
    }

    #[test]
    fn test_cookie_round_trip() {
        let token = Uuid::new_v4();
        let header = format!("theme=dark; {}", session_cookie(token));
        let parsed = token_from_cookie_header(header.split("; Path").next().unwrap_or_default());
        assert_eq!(parsed, Some(token));
        assert_eq!(token_from_cookie_header("hms_session=not-a-uuid"), None);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_dropped() {
        let store = SessionStore::with_limits(Duration::ZERO, 100);
        let first = store
            .push_flash(None, Flash::danger("Unauthorized access"))
            .await
            .expect("anonymous session should be created");

        let second = store.push_flash(Some(first), Flash::danger("again")).await;
        assert!(second.is_some(), "an idle token should not be reused");
        assert_eq!(store.len().await, 1);
        assert!(store.take_flashes(Some(first)).await.is_empty());
    }

    #[tokio::test]
    async fn test_cookieless_flashes_stay_under_the_cap() {
        let store = SessionStore::with_limits(SESSION_IDLE_TIMEOUT, 3);
        let alice = store.login(None, PrincipalRef::Patient(PatientId(1))).await;

        let mut latest = None;
        for _ in 0..1_000 {
            latest = store.push_flash(None, Flash::danger("Unauthorized access")).await;
        }

        assert_eq!(store.len().await, 3);
        assert_eq!(
            store.principal(alice).await,
            Some(PrincipalRef::Patient(PatientId(1))),
            "anonymous sessions are evicted before logged-in ones"
        );
        let latest = latest.expect("each cookieless flash creates a session");
        assert_eq!(
            store.take_flashes(Some(latest)).await,
            vec![Flash::danger("Unauthorized access")]
        );
    }
}
