//! UseCase: ルームへの参加・退出
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RoomMembershipUseCase::join() / leave() メソッド
//! - 参加者本人への room_state と、他メンバーへの user_joined / user_left
//!
//! ### なぜこのテストが必要か
//! - 後から参加した接続がチャット履歴・都市スナップショットを受け取れることを保証
//! - 退出通知が残りのメンバーにだけ届くことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加・退出
//! - エッジケース：参加していないルームからの退出、キャッシュ障害時の参加

use std::sync::Arc;

use serde_json::Value;

use crate::{
    domain::{
        Connection, ConnectionId, GameCache, Room, RoomDeparture, RoomId, RoomKind, RoomMember,
        RoomRepository, cache::keys,
    },
    infrastructure::dto::websocket::ServerEvent,
};

use super::{delivery::Delivery, error::EventError, send_message::ChatHistoryStore};

/// ルーム参加・退出のユースケース
pub struct RoomMembershipUseCase {
    repository: Arc<dyn RoomRepository>,
    cache: Arc<dyn GameCache>,
    history: Arc<ChatHistoryStore>,
    delivery: Arc<Delivery>,
}

impl RoomMembershipUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        cache: Arc<dyn GameCache>,
        history: Arc<ChatHistoryStore>,
        delivery: Arc<Delivery>,
    ) -> Self {
        Self {
            repository,
            cache,
            history,
            delivery,
        }
    }

    /// ルームに参加する
    ///
    /// 参加者本人には room_state（メンバー・直近のチャット・都市スナップショット）を、
    /// 他のメンバーには user_joined を送る。
    pub async fn join(
        &self,
        connection: &Connection,
        room_id: RoomId,
        kind: RoomKind,
    ) -> Result<Room, EventError> {
        let room = self
            .repository
            .join(room_id, kind, RoomMember::from(connection))
            .await;
        let users = room.identities();

        let recent_messages = self.history.load(&room.id).await.into_vec();
        let city = match room.kind {
            RoomKind::City => self.load_city(&room.id).await,
            RoomKind::Guild | RoomKind::Global | RoomKind::Trade => None,
        };
        let state = ServerEvent::RoomState {
            room_id: room.id.clone(),
            users: users.clone(),
            recent_messages,
            city,
        };
        self.delivery
            .to_connection(&connection.id, &state.to_json()?)
            .await;

        let joined = ServerEvent::UserJoined {
            user: connection.identity.clone(),
            room_users: users,
        };
        let others: Vec<ConnectionId> = room
            .connection_ids()
            .into_iter()
            .filter(|id| id != &connection.id)
            .collect();
        self.delivery
            .to_connections(&others, &joined.to_json()?)
            .await;

        tracing::info!(
            "Connection '{}' joined room '{}' ({} member(s))",
            connection.id,
            room.id,
            room.member_count()
        );
        Ok(room)
    }

    /// ルームから退出する（参加していなければ何もしない）
    pub async fn leave(
        &self,
        connection: &Connection,
        room_id: &RoomId,
    ) -> Result<Option<RoomDeparture>, EventError> {
        let Some(departure) = self.repository.leave(room_id, &connection.id).await else {
            tracing::debug!(
                "Connection '{}' is not a member of '{}', ignoring leave",
                connection.id,
                room_id
            );
            return Ok(None);
        };
        announce_departure(&self.delivery, &departure).await?;
        tracing::info!("Connection '{}' left room '{}'", connection.id, room_id);
        Ok(Some(departure))
    }

    async fn load_city(&self, room_id: &RoomId) -> Option<Value> {
        let key = keys::city(room_id);
        self.cache.get(&key).await.unwrap_or_else(|e| {
            tracing::warn!("Failed to load city snapshot '{}': {}", key, e);
            None
        })
    }
}

/// 退出を残りのメンバーに通知する
pub(crate) async fn announce_departure(
    delivery: &Delivery,
    departure: &RoomDeparture,
) -> Result<usize, EventError> {
    if departure.remaining.is_empty() {
        return Ok(0);
    }
    let left = ServerEvent::UserLeft {
        user: departure.member.identity.clone(),
        room_users: departure.remaining_identities(),
    };
    Ok(delivery
        .to_connections(&departure.remaining_connections(), &left.to_json()?)
        .await)
}
