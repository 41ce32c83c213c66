use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::session::{Session, SessionSnapshot};
use crate::messaging_client::MessagingClient;

/// In-memory map from session id to live session.
///
/// Every mutation runs as one closure under the write lock, and the lock is
/// never held across an await on a client, so a slow client call cannot
/// stall other sessions. Mutations that originate from a client carry the
/// generation they belong to and are dropped if the entry has since been
/// replaced or removed.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `session`, returning the entry it replaced.
    pub async fn insert(&self, session: Session) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session)
    }

    /// Inserts `session` only if the current entry still has generation
    /// `expected`, returning the replaced entry. Hands the session back when
    /// the entry was removed or replaced in the meantime.
    pub async fn replace_generation(
        &self,
        session: Session,
        expected: u64,
    ) -> Result<Option<Session>, Session> {
        let mut sessions = self.sessions.write().await;
        let current = sessions.get(&session.id).map(|s| s.generation);
        if current != Some(expected) {
            return Err(session);
        }
        Ok(sessions.insert(session.id.clone(), session))
    }

    pub async fn snapshot(&self, id: &str) -> Option<SessionSnapshot> {
        self.sessions.read().await.get(id).map(Session::snapshot)
    }

    /// The client handle and generation of the session, if it exists.
    pub async fn client(&self, id: &str) -> Option<(Arc<dyn MessagingClient>, u64)> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| (Arc::clone(&s.client), s.generation))
    }

    pub async fn generation_of(&self, id: &str) -> Option<u64> {
        self.sessions.read().await.get(id).map(|s| s.generation)
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Applies `f` to the session if it still belongs to `generation`.
    pub async fn update<F, R>(&self, id: &str, generation: u64, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) if session.generation == generation => Some(f(session)),
            _ => None,
        }
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    /// Removes the session only if it still belongs to `generation`.
    pub async fn remove_generation(&self, id: &str, generation: u64) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(id) {
            Some(session) if session.generation == generation => sessions.remove(id),
            _ => None,
        }
    }

    pub async fn drain(&self) -> Vec<Session> {
        self.sessions.write().await.drain().map(|(_, s)| s).collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
