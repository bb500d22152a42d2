//! WebSocket を使った ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` を接続 ID ごとに管理
//! - `UserId` → 接続 ID の対応を管理
//! - クライアントへのメッセージ送信（push_to, broadcast, broadcast_all）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 2 つの対応表は同じ Mutex で守り、register / unregister を原子的に扱います。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, ConnectionRegistry, MessagePushError, PusherChannel, UserId,
};

struct ClientEntry {
    connection: Connection,
    sender: PusherChannel,
}

#[derive(Default)]
struct Registry {
    clients: HashMap<ConnectionId, ClientEntry>,
    users: HashMap<UserId, ConnectionId>,
}

/// WebSocket を使った ConnectionRegistry 実装
///
/// ```ignore
/// let registry = WebSocketConnectionRegistry::new();
/// registry.register(connection, tx).await;
/// registry.push_to(&connection_id, "{\"event\":\"heartbeat\",\"data\":{}}").await?;
/// ```
#[derive(Default)]
pub struct WebSocketConnectionRegistry {
    inner: Mutex<Registry>,
}

impl WebSocketConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for WebSocketConnectionRegistry {
    async fn register(&self, connection: Connection, sender: PusherChannel) {
        let mut registry = self.inner.lock().await;
        let connection_id = connection.id;
        if let Some(user_id) = connection.user_id() {
            if let Some(previous) = registry.users.insert(user_id.clone(), connection_id) {
                tracing::debug!(
                    "User '{}' superseded connection '{}' with '{}'",
                    user_id,
                    previous,
                    connection_id
                );
            }
        }
        registry
            .clients
            .insert(connection_id, ClientEntry { connection, sender });
        tracing::debug!("Connection '{}' registered", connection_id);
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let mut registry = self.inner.lock().await;
        let entry = registry.clients.remove(connection_id)?;
        if let Some(user_id) = entry.connection.user_id()
            && registry.users.get(user_id) == Some(connection_id)
        {
            registry.users.remove(user_id);
        }
        tracing::debug!("Connection '{}' unregistered", connection_id);
        Some(entry.connection)
    }

    async fn resolve(&self, user_id: &UserId) -> Option<ConnectionId> {
        let registry = self.inner.lock().await;
        registry.users.get(user_id).copied()
    }

    async fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        let registry = self.inner.lock().await;
        registry
            .clients
            .get(connection_id)
            .is_some_and(|entry| !entry.sender.is_closed())
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let registry = self.inner.lock().await;
        let entry = registry
            .clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;
        entry
            .sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to connection '{}'", connection_id);
        Ok(())
    }

    async fn broadcast(&self, targets: &[ConnectionId], content: &str) -> usize {
        let registry = self.inner.lock().await;
        let mut delivered = 0;
        for target in targets {
            match registry.clients.get(target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(entry) => {
                    if let Err(e) = entry.sender.send(content.to_string()) {
                        tracing::warn!("Failed to push message to connection '{}': {}", target, e);
                    } else {
                        delivered += 1;
                    }
                }
                None => {
                    tracing::debug!("Connection '{}' not found during broadcast, skipping", target);
                }
            }
        }
        delivered
    }

    async fn broadcast_all(&self, content: &str) -> usize {
        let registry = self.inner.lock().await;
        registry
            .clients
            .iter()
            .filter(|(id, entry)| match entry.sender.send(content.to_string()) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to push message to connection '{}': {}", id, e);
                    false
                }
            })
            .count()
    }

    async fn connection_count(&self) -> usize {
        let registry = self.inner.lock().await;
        registry.clients.len()
    }
}
