//! UseCase: 管理・参照用の操作
//!
//! ルームの参照と、任意イベントの個別送信・ルーム配信を提供します。
//! HTTP からは参照系のみを公開しています。

use std::sync::Arc;

use serde_json::Value;

use crate::{
    domain::{ConnectionRegistry, Room, RoomId, RoomRepository, RoomSummary, UserId},
    infrastructure::dto::websocket::Envelope,
};

use super::{delivery::Delivery, error::EventError};

pub struct RoomAdminUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    delivery: Arc<Delivery>,
}

impl RoomAdminUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        delivery: Arc<Delivery>,
    ) -> Self {
        Self {
            repository,
            registry,
            delivery,
        }
    }

    /// ルームの種別とメンバー数（存在しなければ `None`）
    pub async fn room_info(&self, room_id: &RoomId) -> Option<RoomSummary> {
        self.repository
            .get_room(room_id)
            .await
            .map(|room| RoomSummary::from(&room))
    }

    /// 全ルームの一覧（ルーム ID 順）
    pub async fn all_rooms(&self) -> Vec<RoomSummary> {
        self.repository
            .list_rooms()
            .await
            .iter()
            .map(RoomSummary::from)
            .collect()
    }

    pub async fn room_detail(&self, room_id: &RoomId) -> Option<Room> {
        self.repository.get_room(room_id).await
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.connection_count().await
    }

    /// ユーザーの現在の接続へ任意のイベントを送る（オフラインなら `false`）
    pub async fn send_to_user(
        &self,
        user_id: &UserId,
        event: &str,
        data: &Value,
    ) -> Result<bool, EventError> {
        let json = Envelope::new(event, data).to_json()?;
        Ok(self.delivery.to_user(user_id, &json).await)
    }

    /// ルームの全メンバーへ任意のイベントを送る
    pub async fn broadcast_to_room(
        &self,
        room_id: &RoomId,
        event: &str,
        data: &Value,
    ) -> Result<usize, EventError> {
        let json = Envelope::new(event, data).to_json()?;
        Ok(self.delivery.to_room(room_id, &json, None).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RoomKind, RoomMember},
        usecase::test_support::{TestContext, drain, room, user},
    };
    use serde_json::json;

    fn create_usecase(ctx: &TestContext) -> RoomAdminUseCase {
        RoomAdminUseCase::new(
            ctx.repository.clone(),
            ctx.registry.clone(),
            ctx.delivery.clone(),
        )
    }

    #[tokio::test]
    async fn test_room_info_and_all_rooms() {
        // テスト項目: ルームの種別とメンバー数（匿名を含む）を参照できる
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = create_usecase(&ctx);
        let (alice, _a) = ctx.connect(Some("u1")).await;
        let (spectator, _s) = ctx.connect(None).await;
        ctx.repository.join(room("global"), RoomKind::Global, RoomMember::from(&alice)).await;
        ctx.repository.join(room("global"), RoomKind::Global, RoomMember::from(&spectator)).await;
        ctx.repository.join(room("city1"), RoomKind::City, RoomMember::from(&alice)).await;

        // when (操作):
        let info = usecase.room_info(&room("global")).await;
        let missing = usecase.room_info(&room("nowhere")).await;
        let rooms = usecase.all_rooms().await;

        // then (期待する結果):
        let info = info.unwrap();
        assert_eq!(info.kind, RoomKind::Global);
        assert_eq!(info.member_count, 2);
        assert!(missing.is_none());
        let ids: Vec<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["city1", "global"]);
    }

    #[tokio::test]
    async fn test_send_to_user_and_broadcast_to_room() {
        // テスト項目: 任意のイベントを個別送信・ルーム配信できる
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = create_usecase(&ctx);
        let (alice, mut alice_rx) = ctx.connect(Some("u1")).await;
        let (bob, mut bob_rx) = ctx.connect(Some("u2")).await;
        ctx.repository.join(room("guild1"), RoomKind::Guild, RoomMember::from(&alice)).await;
        ctx.repository.join(room("guild1"), RoomKind::Guild, RoomMember::from(&bob)).await;
        let notice = json!({"text": "season ends soon"});

        // when (操作):
        let direct = usecase.send_to_user(&user("u2"), "notice", &notice).await.unwrap();
        let offline = usecase.send_to_user(&user("u9"), "notice", &notice).await.unwrap();
        let broadcast = usecase
            .broadcast_to_room(&room("guild1"), "guild_event", &notice)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(direct);
        assert!(!offline);
        assert_eq!(broadcast, 2);
        assert_eq!(
            drain(&mut bob_rx),
            vec![
                json!({"event": "notice", "data": notice}),
                json!({"event": "guild_event", "data": notice}),
            ]
        );
        assert_eq!(drain(&mut alice_rx).len(), 1);
    }
}
