//! UseCase: チャットメッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - ChatHistoryStore によるキャッシュ上の履歴（直近 100 件）の更新
//!
//! ### なぜこのテストが必要か
//! - 送信者を含むルーム全体に new_message が届くことを保証
//! - 空白のみのメッセージは配送も履歴更新もしないことを保証
//! - キャッシュ障害時も配送は継続することを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：認証済み・匿名の送信
//! - 異常系：空白のみの本文、キャッシュ障害
//! - エッジケース：101 件目の送信で最古のメッセージが押し出される

use std::sync::Arc;

use machiya_shared::time::Clock;
use uuid::Uuid;

use crate::{
    domain::{
        ChatHistory, ChatMessage, Connection, GameCache, Identity, MessageContent, MessageKind,
        RoomId, Timestamp,
        cache::{CHAT_HISTORY_TTL, keys},
        entity::ANONYMOUS_NAME,
    },
    infrastructure::dto::websocket::ServerEvent,
};

use super::{delivery::Delivery, error::EventError};

/// キャッシュ上のルームごとのチャット履歴
///
/// 読み込み → 追加 → 書き戻しの間の競合による更新の消失は許容する。
pub struct ChatHistoryStore {
    cache: Arc<dyn GameCache>,
}

impl ChatHistoryStore {
    pub fn new(cache: Arc<dyn GameCache>) -> Self {
        Self { cache }
    }

    /// 履歴を読み込む。キャッシュ障害・破損データは空の履歴として扱う。
    pub async fn load(&self, room_id: &RoomId) -> ChatHistory {
        let key = keys::chat(room_id);
        match self.cache.get(&key).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable chat history '{}': {}", key, e);
                ChatHistory::new()
            }),
            Ok(None) => ChatHistory::new(),
            Err(e) => {
                tracing::warn!("Failed to load chat history '{}': {}", key, e);
                ChatHistory::new()
            }
        }
    }

    /// 履歴の末尾にメッセージを追加して書き戻す
    pub async fn append(&self, room_id: &RoomId, message: ChatMessage) {
        let key = keys::chat(room_id);
        let mut history = self.load(room_id).await;
        let evicted = history.push(message);
        if !evicted.is_empty() {
            tracing::debug!("Evicted {} message(s) from '{}'", evicted.len(), key);
        }

        let value = match serde_json::to_value(&history) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to encode chat history '{}': {}", key, e);
                return;
            }
        };
        if let Err(e) = self.cache.set(&key, value, Some(CHAT_HISTORY_TTL)).await {
            tracing::warn!("Failed to store chat history '{}': {}", key, e);
        }
    }
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    history: Arc<ChatHistoryStore>,
    delivery: Arc<Delivery>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        history: Arc<ChatHistoryStore>,
        delivery: Arc<Delivery>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            history,
            delivery,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `connection` - 送信元の接続（匿名可）
    /// * `room_id` - 送信先のルーム
    /// * `content` - 本文（空白のみは不可）
    /// * `kind` - メッセージ種別
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 配送したメッセージ
    /// * `Err(EventError::InvalidPayload)` - 本文が空白のみ、または長すぎる
    pub async fn execute(
        &self,
        connection: &Connection,
        room_id: RoomId,
        content: String,
        kind: MessageKind,
    ) -> Result<ChatMessage, EventError> {
        let content = MessageContent::new(content)?;

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            sender_id: connection.user_id().cloned(),
            sender_name: connection
                .identity
                .as_ref()
                .map_or(ANONYMOUS_NAME, Identity::display_name)
                .to_string(),
            content,
            kind,
            timestamp: Timestamp::new(self.clock.now_millis()),
            room: room_id.clone(),
        };

        self.history.append(&room_id, message.clone()).await;

        let json = ServerEvent::NewMessage(message.clone()).to_json()?;
        let delivered = self.delivery.to_room(&room_id, &json, None).await;
        tracing::debug!(
            "Message '{}' delivered to {} member(s) of '{}'",
            message.id,
            delivered,
            room_id
        );
        Ok(message)
    }
}
