//! Cookie-keyed session storage.
//!
//! Each browser gets a random id in the `repas_session` cookie once its session holds something
//! worth keeping. The [`Session`] behind it is copied out at the start of a request and written
//! back at the end, so the lock is never held across an await.
//!
//! Only sessions that differ from [`Session::default`] are stored. Entries idle for longer than
//! the store's TTL are dropped, and the least recently seen entry makes room when the store is
//! full.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use repas_core::Session;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const SESSION_COOKIE: &str = "repas_session";

/// How long an untouched session is kept.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound on stored sessions.
pub const MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
struct Entry {
    session: Session,
    last_seen: Instant,
}

#[derive(Clone, Debug)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Entry>>>,
    idle_ttl: Duration,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(SESSION_IDLE_TTL, MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
            capacity: capacity.max(1),
        }
    }

    /// Copy of the session stored under `id`, or a fresh one.
    pub fn load(&self, id: &str) -> Session {
        let mut sessions = self.lock();
        match sessions.get(id) {
            Some(entry) if entry.last_seen.elapsed() < self.idle_ttl => entry.session.clone(),
            Some(_) => {
                sessions.remove(id);
                Session::default()
            }
            None => Session::default(),
        }
    }

    /// Stores `session` under `id`. A default session is not kept.
    pub fn save(&self, id: &str, session: Session) {
        let mut sessions = self.lock();
        if session == Session::default() {
            sessions.remove(id);
            return;
        }

        let idle_ttl = self.idle_ttl;
        sessions.retain(|_, entry| entry.last_seen.elapsed() < idle_ttl);

        if !sessions.contains_key(id) && sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                tracing::debug!("session store full, evicting {}", oldest);
                sessions.remove(&oldest);
            }
        }

        sessions.insert(
            id.to_string(),
            Entry {
                session,
                last_seen: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Session id from the request cookies, if it looks like one we issued.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| is_valid_id(value))
}

fn is_valid_id(value: &str) -> bool {
    value.len() == 32 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// One request's view of its session.
#[derive(Debug)]
pub struct Visit {
    id: String,
    fresh: bool,
    pub session: Session,
}

impl Visit {
    pub fn start(store: &SessionStore, headers: &HeaderMap) -> Self {
        match session_id(headers) {
            Some(id) => Self {
                session: store.load(&id),
                id,
                fresh: false,
            },
            None => Self {
                id: new_session_id(),
                fresh: true,
                session: Session::new(),
            },
        }
    }

    /// Stores the session and attaches the cookie when one was just issued.
    ///
    /// A fresh visit that leaves the session untouched stores nothing and sets no cookie.
    pub fn finish(self, store: &SessionStore, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        let untouched = self.session == Session::default();
        if self.fresh && untouched {
            return response;
        }

        if self.fresh {
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, self.id
            );
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => tracing::error!("could not build session cookie: {}", e),
            }
        }
        store.save(&self.id, self.session);
        response
    }
}
