// Connection hub - live sessions and message fan-out
//
// Each session owns one bounded outbound queue. The hub keeps the only sender,
// so removing a session from the map is what closes its queue.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::{NetworkError, NetworkResult};
use crate::PlayerId;

/// A message serialized once and shared by every recipient.
pub type Outbound = Arc<str>;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct SessionHandle {
    id: Uuid,
    player_id: PlayerId,
    sender: mpsc::Sender<Outbound>,
}

impl SessionHandle {
    /// Creates a session and the receiving end of its outbound queue.
    pub fn new(player_id: impl Into<PlayerId>, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: Uuid::new_v4(),
            player_id: player_id.into(),
            sender,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }
}

#[derive(Debug, Default)]
pub struct ConnectionHub {
    sessions: RwLock<HashMap<PlayerId, SessionHandle>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session under its player id. An older session for the same
    /// player is replaced and its queue closed; its id is returned.
    pub async fn register(&self, session: SessionHandle) -> Option<Uuid> {
        let player_id = session.player_id.clone();
        let session_id = session.id;
        let replaced = self.sessions.write().await.insert(player_id.clone(), session);
        match &replaced {
            Some(old) => log::info!(
                "🔁 Session {} replaced {} for player {}",
                session_id,
                old.id,
                player_id
            ),
            None => log::info!("🔌 Session {} registered for player {}", session_id, player_id),
        }
        replaced.map(|old| old.id)
    }

    /// Removes the session only if it is still the one on record.
    pub async fn unregister(&self, player_id: &str, session_id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.get(player_id).map(|s| s.id) != Some(session_id) {
            return false;
        }
        sessions.remove(player_id);
        log::info!("👋 Session {} unregistered for player {}", session_id, player_id);
        true
    }

    /// Removes whatever session is on record for the player.
    pub async fn unregister_player(&self, player_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(player_id);
        if let Some(session) = &removed {
            log::info!("👋 Session {} unregistered for player {}", session.id, player_id);
        }
        removed.is_some()
    }

    /// Sends to every session. Returns how many queues accepted the message.
    pub async fn broadcast<T: Serialize>(&self, message: &T) -> NetworkResult<usize> {
        let payload = encode(message)?;
        let mut delivered = 0;
        let mut stale = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for session in sessions.values() {
                match session.sender.try_send(payload.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        log::warn!(
                            "🐢 Outbound queue full for {}, dropping session {}",
                            session.player_id,
                            session.id
                        );
                        stale.push((session.player_id.clone(), session.id));
                    }
                    Err(TrySendError::Closed(_)) => {
                        stale.push((session.player_id.clone(), session.id));
                    }
                }
            }
        }
        self.evict(stale).await;
        Ok(delivered)
    }

    pub async fn send_to_player<T: Serialize>(&self, player_id: &str, message: &T) -> NetworkResult<()> {
        let payload = encode(message)?;
        let (session_id, result) = {
            let sessions = self.sessions.read().await;
            let session = sessions
                .get(player_id)
                .ok_or_else(|| NetworkError::RecipientNotFound {
                    player_id: player_id.to_string(),
                })?;
            (session.id, session.sender.try_send(payload))
        };

        match result {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                log::warn!(
                    "🐢 Outbound queue full for {}, dropping session {}",
                    player_id,
                    session_id
                );
                self.evict(vec![(player_id.to_string(), session_id)]).await;
                Err(NetworkError::QueueFull {
                    player_id: player_id.to_string(),
                })
            }
            Err(TrySendError::Closed(_)) => {
                self.evict(vec![(player_id.to_string(), session_id)]).await;
                Err(NetworkError::ConnectionClosed {
                    details: format!("queue for {player_id} is closed"),
                })
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn is_connected(&self, player_id: &str) -> bool {
        self.sessions.read().await.contains_key(player_id)
    }

    /// Forced unregistration. Guarded by session id so a session that replaced
    /// the stale one in the meantime survives.
    async fn evict(&self, stale: Vec<(PlayerId, Uuid)>) {
        if stale.is_empty() {
            return;
        }
        let mut sessions = self.sessions.write().await;
        for (player_id, session_id) in stale {
            if sessions.get(&player_id).map(|s| s.id) == Some(session_id) {
                sessions.remove(&player_id);
                log::warn!("🚫 Evicted session {} for player {}", session_id, player_id);
            }
        }
    }
}

fn encode<T: Serialize>(message: &T) -> NetworkResult<Outbound> {
    serde_json::to_string(message)
        .map(Arc::from)
        .map_err(|e| NetworkError::serialization_failed(e.to_string()))
}
