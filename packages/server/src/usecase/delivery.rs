//! 送信先の解決と配送
//!
//! ルーム・ユーザー・全接続といった宛先を接続 ID に解決し、ConnectionRegistry 経由で
//! エンコード済みのイベントを配送します。送信失敗は「受信者オフライン」として扱い、
//! 呼び出し元へは伝播しません。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, RoomId, RoomRepository, UserId};

pub struct Delivery {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl Delivery {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// 1 接続へ配送する。閉じた接続への配送は何もしない。
    pub async fn to_connection(&self, connection_id: &ConnectionId, json: &str) -> bool {
        if !self.registry.is_connected(connection_id).await {
            tracing::debug!("Connection '{}' is offline, skipping delivery", connection_id);
            return false;
        }
        match self.registry.push_to(connection_id, json).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Recipient '{}' offline: {}", connection_id, e);
                false
            }
        }
    }

    /// ユーザーの現在の接続へ配送する
    pub async fn to_user(&self, user_id: &UserId, json: &str) -> bool {
        match self.registry.resolve(user_id).await {
            Some(connection_id) => self.to_connection(&connection_id, json).await,
            None => {
                tracing::debug!("User '{}' is not connected, skipping delivery", user_id);
                false
            }
        }
    }

    pub async fn to_connections(&self, targets: &[ConnectionId], json: &str) -> usize {
        if targets.is_empty() {
            return 0;
        }
        self.registry.broadcast(targets, json).await
    }

    /// ルームのメンバーへ配送する（`except` を指定した場合はその接続を除く）
    pub async fn to_room(
        &self,
        room_id: &RoomId,
        json: &str,
        except: Option<&ConnectionId>,
    ) -> usize {
        let targets: Vec<ConnectionId> = self
            .repository
            .member_connections(room_id)
            .await
            .into_iter()
            .filter(|id| Some(id) != except)
            .collect();
        self.to_connections(&targets, json).await
    }

    pub async fn to_all(&self, json: &str) -> usize {
        self.registry.broadcast_all(json).await
    }
}
