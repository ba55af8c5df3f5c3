//! Live connection registry
//!
//! Every authenticated socket gets a handle here. Handles are grouped by user
//! (all devices of one account) and by conversation (match id). Pushes are
//! best effort: a user or conversation with no live handle is a silent no-op
//! and nothing is queued for later delivery.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// A server-to-client frame: `{"event": ..., "data": ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEvent {
    pub event: String,
    pub data: serde_json::Value,
}

impl ServerEvent {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

#[derive(Debug)]
struct ConnectionHandle {
    user_id: Uuid,
    sender: mpsc::UnboundedSender<ServerEvent>,
    conversations: HashSet<Uuid>,
}

#[derive(Debug, Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, ConnectionHandle>,
    users: HashMap<Uuid, HashSet<ConnectionId>>,
    conversations: HashMap<Uuid, HashSet<ConnectionId>>,
}

impl RegistryState {
    fn detach(&mut self, connection_id: ConnectionId) -> Option<ConnectionHandle> {
        let handle = self.connections.remove(&connection_id)?;

        if let Some(group) = self.users.get_mut(&handle.user_id) {
            group.remove(&connection_id);
            if group.is_empty() {
                self.users.remove(&handle.user_id);
            }
        }
        for conversation_id in &handle.conversations {
            if let Some(group) = self.conversations.get_mut(conversation_id) {
                group.remove(&connection_id);
                if group.is_empty() {
                    self.conversations.remove(conversation_id);
                }
            }
        }

        Some(handle)
    }

    fn deliver<'a>(&self, targets: impl Iterator<Item = &'a ConnectionId>, event: &ServerEvent) -> usize {
        targets
            .filter_map(|id| self.connections.get(id))
            .filter(|handle| handle.sender.send(event.clone()).is_ok())
            .count()
    }
}

/// Cheap to clone; all clones share the same groups.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an authenticated connection to its user's group. The receiver
    /// yields every event pushed to that user or to a joined conversation.
    pub async fn register(&self, user_id: Uuid) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();

        let mut state = self.state.write().await;
        state.connections.insert(
            connection_id,
            ConnectionHandle {
                user_id,
                sender,
                conversations: HashSet::new(),
            },
        );
        state.users.entry(user_id).or_default().insert(connection_id);
        let devices = state.users.get(&user_id).map_or(0, HashSet::len);
        drop(state);

        tracing::info!(
            "🔌 Connection {} registered for user {} ({} live)",
            connection_id, user_id, devices
        );
        (connection_id, receiver)
    }

    /// Returns false when the connection is no longer registered.
    pub async fn join_conversation(&self, connection_id: ConnectionId, conversation_id: Uuid) -> bool {
        let mut state = self.state.write().await;
        let Some(handle) = state.connections.get_mut(&connection_id) else {
            return false;
        };
        handle.conversations.insert(conversation_id);
        state
            .conversations
            .entry(conversation_id)
            .or_default()
            .insert(connection_id);
        true
    }

    /// Drops the connection from every group it belonged to.
    pub async fn remove(&self, connection_id: ConnectionId) {
        let removed = self.state.write().await.detach(connection_id);
        if let Some(handle) = removed {
            tracing::info!(
                "🔌 Connection {} for user {} disconnected",
                connection_id, handle.user_id
            );
        }
    }

    /// Drops every live connection of a user. Their sockets close once the
    /// outbound channel is gone.
    pub async fn drop_user(&self, user_id: Uuid) -> usize {
        let mut state = self.state.write().await;
        let ids: Vec<ConnectionId> = state
            .users
            .get(&user_id)
            .map(|group| group.iter().copied().collect())
            .unwrap_or_default();
        for id in &ids {
            state.detach(*id);
        }
        if !ids.is_empty() {
            tracing::info!("🔌 Dropped {} connection(s) for user {}", ids.len(), user_id);
        }
        ids.len()
    }

    pub async fn user_of(&self, connection_id: ConnectionId) -> Option<Uuid> {
        self.state
            .read()
            .await
            .connections
            .get(&connection_id)
            .map(|handle| handle.user_id)
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.state.read().await.users.contains_key(&user_id)
    }

    /// Returns how many connections accepted the event.
    pub async fn send_to_user(&self, user_id: Uuid, event: ServerEvent) -> usize {
        let state = self.state.read().await;
        let delivered = match state.users.get(&user_id) {
            Some(group) => state.deliver(group.iter(), &event),
            None => 0,
        };
        tracing::debug!("📨 {} -> user {} ({} connection(s))", event.event, user_id, delivered);
        delivered
    }

    pub async fn send_to_conversation(&self, conversation_id: Uuid, event: ServerEvent) -> usize {
        let state = self.state.read().await;
        let delivered = match state.conversations.get(&conversation_id) {
            Some(group) => state.deliver(group.iter(), &event),
            None => 0,
        };
        tracing::debug!(
            "📨 {} -> conversation {} ({} connection(s))",
            event.event, conversation_id, delivered
        );
        delivered
    }
}
