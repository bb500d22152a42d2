//! 受信イベントのルーティング
//!
//! テキストフレームを [`ClientEvent`] にデコードし、対応するユースケースへ振り分ける。
//! デコードやユースケースの失敗はその 1 件を破棄するだけで、接続は維持する。

use std::sync::Arc;

use thiserror::Error;

use crate::{
    domain::Connection,
    infrastructure::dto::websocket::{ClientEvent, EventName},
    usecase::{
        EventError, GameEventUseCase, LeaderboardUseCase, MonitorUseCase, QuestUseCase,
        RoomMembershipUseCase, SendMessageUseCase, TradeUseCase,
    },
};

/// 1 件の受信フレームを破棄した理由
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("'{event}' failed: {source}")]
    Failed {
        event: EventName,
        #[source]
        source: EventError,
    },
}

pub struct EventRouter {
    pub room_membership_usecase: Arc<RoomMembershipUseCase>,
    pub game_event_usecase: Arc<GameEventUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub trade_usecase: Arc<TradeUseCase>,
    pub quest_usecase: Arc<QuestUseCase>,
    pub leaderboard_usecase: Arc<LeaderboardUseCase>,
    pub monitor_usecase: Arc<MonitorUseCase>,
}

impl EventRouter {
    /// 1 件のテキストフレームを処理する
    ///
    /// 失敗は warn ログに記録したうえで呼び出し元にも返す。
    pub async fn dispatch(
        &self,
        connection: &Connection,
        text: &str,
    ) -> Result<EventName, DispatchError> {
        let result = self.try_dispatch(connection, text).await;
        if let Err(e) = &result {
            tracing::warn!("Dropping event from '{}': {}", connection.id, e);
        }
        result
    }

    async fn try_dispatch(
        &self,
        connection: &Connection,
        text: &str,
    ) -> Result<EventName, DispatchError> {
        let event = ClientEvent::parse(text)?;
        let name = event.name();
        tracing::debug!("Received '{}' from '{}'", name, connection.id);

        if let Some(user_id) = connection.user_id() {
            self.monitor_usecase
                .record(user_id, name.as_str(), event.sample_value())
                .await;
        }

        self.route(connection, event)
            .await
            .map_err(|source| DispatchError::Failed {
                event: name,
                source,
            })?;
        Ok(name)
    }

    async fn route(&self, connection: &Connection, event: ClientEvent) -> Result<(), EventError> {
        match event {
            ClientEvent::JoinRoom(payload) => {
                self.room_membership_usecase
                    .join(connection, payload.room_id, payload.kind)
                    .await?;
            }
            ClientEvent::LeaveRoom(payload) => {
                self.room_membership_usecase
                    .leave(connection, &payload.into_room_id())
                    .await?;
            }
            ClientEvent::CityUpdate(payload) => {
                self.game_event_usecase
                    .city_update(connection, payload.room_id, payload.city_data)
                    .await?;
            }
            ClientEvent::CollectResources(payload) => {
                self.game_event_usecase
                    .collect_resources(
                        connection,
                        payload.room_id,
                        payload.resource_type,
                        payload.amount,
                    )
                    .await?;
            }
            ClientEvent::BuildingPlaced(payload) => {
                self.game_event_usecase
                    .building_placed(connection, payload.room_id, payload.building)
                    .await?;
            }
            ClientEvent::SendMessage(payload) => {
                self.send_message_usecase
                    .execute(
                        connection,
                        payload.room_id,
                        payload.message.content,
                        payload.message.kind,
                    )
                    .await?;
            }
            ClientEvent::TradeOffer(payload) => {
                self.trade_usecase
                    .offer(
                        connection,
                        payload.trade_id,
                        &payload.to_user_id,
                        payload.offer,
                        payload.request,
                    )
                    .await?;
            }
            ClientEvent::TradeAccepted(payload) => {
                self.trade_usecase
                    .accept(connection, payload.trade_id, &payload.from_user_id)
                    .await?;
            }
            ClientEvent::QuestProgress(payload) => {
                self.quest_usecase
                    .progress(connection, payload.quest_id, payload.progress)
                    .await?;
            }
            ClientEvent::QuestCompleted(payload) => {
                self.quest_usecase
                    .completed(connection, payload.quest_id, payload.rewards)
                    .await?;
            }
            ClientEvent::ScoreUpdated(payload) => {
                self.leaderboard_usecase
                    .score_updated(connection, payload.score)
                    .await?;
            }
        }
        Ok(())
    }
}
