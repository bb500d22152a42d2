//! UseCase: クエスト進捗・達成の通知

use std::sync::Arc;

use serde_json::Value;

use crate::{
    domain::{Connection, RoomId},
    infrastructure::dto::websocket::ServerEvent,
};

use super::{
    delivery::Delivery,
    error::{EventError, require_identity},
};

pub struct QuestUseCase {
    delivery: Arc<Delivery>,
}

impl QuestUseCase {
    pub fn new(delivery: Arc<Delivery>) -> Self {
        Self { delivery }
    }

    /// 進捗を `friends:<userId>` ルームへ通知する
    ///
    /// このルームのメンバー構成はフレンド関係を管理する外部サービスが決める。
    pub async fn progress(
        &self,
        connection: &Connection,
        quest_id: String,
        progress: Value,
    ) -> Result<usize, EventError> {
        let identity = require_identity(connection)?;
        let event = ServerEvent::QuestUpdated {
            user_id: identity.user_id.clone(),
            quest_id,
            progress,
        };
        Ok(self
            .delivery
            .to_room(&RoomId::friends_of(&identity.user_id), &event.to_json()?, None)
            .await)
    }

    /// 達成を全接続へ通知する
    pub async fn completed(
        &self,
        connection: &Connection,
        quest_id: String,
        rewards: Value,
    ) -> Result<usize, EventError> {
        let identity = require_identity(connection)?;
        let event = ServerEvent::AchievementUnlocked {
            user_id: identity.user_id.clone(),
            username: identity.username.clone(),
            quest_id,
            rewards,
        };
        Ok(self.delivery.to_all(&event.to_json()?).await)
    }
}
