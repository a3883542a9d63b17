use std::{collections::HashMap, sync::Arc};

use docqa_chat::ChatSession;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub type SessionId = String;

/// Chat sessions keyed by id.
///
/// Each session sits behind its own mutex so messages within one session are
/// answered one at a time while different sessions proceed independently.
#[derive(Debug, Default, Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Mutex<ChatSession>>>>>,
}

impl SessionManager {
    pub async fn create_session(&self) -> SessionId {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::new(Mutex::new(ChatSession::default())));
        session_id
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Drop a session. Returns `false` if it did not exist.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
