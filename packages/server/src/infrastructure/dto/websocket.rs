//! WebSocket message DTOs.
//!
//! Every text frame is a JSON envelope `{"event": "<name>", "data": <payload>}`
//! in both directions. Inbound frames decode into [`ClientEvent`], outbound
//! frames are produced from [`ServerEvent`] (or [`Envelope`] for custom admin
//! events).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ChatMessage, Identity, LeaderboardEntry, MessageKind, RoomId, RoomKind, UserId};

// ========================================
// Inbound (client → server)
// ========================================

/// 受信イベント名の閉じた集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    JoinRoom,
    LeaveRoom,
    CityUpdate,
    CollectResources,
    BuildingPlaced,
    SendMessage,
    TradeOffer,
    TradeAccepted,
    QuestProgress,
    QuestCompleted,
    ScoreUpdated,
}

impl EventName {
    pub const ALL: [EventName; 11] = [
        EventName::JoinRoom,
        EventName::LeaveRoom,
        EventName::CityUpdate,
        EventName::CollectResources,
        EventName::BuildingPlaced,
        EventName::SendMessage,
        EventName::TradeOffer,
        EventName::TradeAccepted,
        EventName::QuestProgress,
        EventName::QuestCompleted,
        EventName::ScoreUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::JoinRoom => "join_room",
            EventName::LeaveRoom => "leave_room",
            EventName::CityUpdate => "city_update",
            EventName::CollectResources => "collect_resources",
            EventName::BuildingPlaced => "building_placed",
            EventName::SendMessage => "send_message",
            EventName::TradeOffer => "trade_offer",
            EventName::TradeAccepted => "trade_accepted",
            EventName::QuestProgress => "quest_progress",
            EventName::QuestCompleted => "quest_completed",
            EventName::ScoreUpdated => "score_updated",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound event decoded from a text frame
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom(JoinRoomPayload),
    LeaveRoom(LeaveRoomPayload),
    CityUpdate(CityUpdatePayload),
    CollectResources(CollectResourcesPayload),
    BuildingPlaced(BuildingPlacedPayload),
    SendMessage(SendMessagePayload),
    TradeOffer(TradeOfferPayload),
    TradeAccepted(TradeAcceptedPayload),
    QuestProgress(QuestProgressPayload),
    QuestCompleted(QuestCompletedPayload),
    ScoreUpdated(ScoreUpdatedPayload),
}

impl ClientEvent {
    /// テキストフレームをデコードする（未知のイベント名・形状不一致はエラー）
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn name(&self) -> EventName {
        match self {
            ClientEvent::JoinRoom(_) => EventName::JoinRoom,
            ClientEvent::LeaveRoom(_) => EventName::LeaveRoom,
            ClientEvent::CityUpdate(_) => EventName::CityUpdate,
            ClientEvent::CollectResources(_) => EventName::CollectResources,
            ClientEvent::BuildingPlaced(_) => EventName::BuildingPlaced,
            ClientEvent::SendMessage(_) => EventName::SendMessage,
            ClientEvent::TradeOffer(_) => EventName::TradeOffer,
            ClientEvent::TradeAccepted(_) => EventName::TradeAccepted,
            ClientEvent::QuestProgress(_) => EventName::QuestProgress,
            ClientEvent::QuestCompleted(_) => EventName::QuestCompleted,
            ClientEvent::ScoreUpdated(_) => EventName::ScoreUpdated,
        }
    }

    /// 監視用の数値（量・スコアを持つイベントのみ）
    pub fn sample_value(&self) -> Option<f64> {
        match self {
            ClientEvent::CollectResources(payload) => Some(payload.amount),
            ClientEvent::ScoreUpdated(payload) => Some(payload.score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: RoomId,
    #[serde(rename = "type")]
    pub kind: RoomKind,
}

/// `leave_room` accepts either a bare room id or `{roomId}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LeaveRoomPayload {
    Bare(RoomId),
    Object {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
}

impl LeaveRoomPayload {
    pub fn into_room_id(self) -> RoomId {
        match self {
            LeaveRoomPayload::Bare(room_id) | LeaveRoomPayload::Object { room_id } => room_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityUpdatePayload {
    pub room_id: RoomId,
    pub city_data: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResourcesPayload {
    pub room_id: RoomId,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingPlacedPayload {
    pub room_id: RoomId,
    pub building: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_id: RoomId,
    pub message: MessageDraft,
}

/// Client-supplied part of a chat message; the server fills in the rest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageDraft {
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOfferPayload {
    pub trade_id: String,
    pub to_user_id: UserId,
    pub offer: Value,
    #[serde(default)]
    pub request: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeAcceptedPayload {
    pub trade_id: String,
    pub from_user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestProgressPayload {
    pub quest_id: String,
    pub progress: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestCompletedPayload {
    pub quest_id: String,
    pub rewards: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreUpdatedPayload {
    pub score: f64,
}

// ========================================
// Outbound (server → client)
// ========================================

/// Outbound event pushed to one or more connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    RoomState {
        room_id: RoomId,
        users: Vec<Identity>,
        recent_messages: Vec<ChatMessage>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        city: Option<Value>,
    },
    UserJoined {
        user: Option<Identity>,
        room_users: Vec<Identity>,
    },
    UserLeft {
        user: Option<Identity>,
        room_users: Vec<Identity>,
    },
    CityUpdated(Value),
    ResourcesCollected {
        user_id: Option<UserId>,
        #[serde(rename = "type")]
        resource_type: String,
        amount: f64,
    },
    BuildingAdded {
        user_id: UserId,
        building: Value,
    },
    NewMessage(ChatMessage),
    TradeReceived {
        trade_id: String,
        offer: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request: Option<Value>,
        from_user: Identity,
    },
    TradeCreated {
        trade_id: String,
        from_user: Identity,
    },
    TradeCompleted {
        trade_id: String,
    },
    QuestUpdated {
        user_id: UserId,
        quest_id: String,
        progress: Value,
    },
    AchievementUnlocked {
        user_id: UserId,
        username: Option<String>,
        quest_id: String,
        rewards: Value,
    },
    LeaderboardUpdated {
        entries: Vec<LeaderboardEntry>,
        updated_user: UpdatedUser,
    },
    Heartbeat {
        timestamp: i64,
    },
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedUser {
    pub user_id: UserId,
    pub username: Option<String>,
    pub new_score: f64,
}

/// Free-form envelope used by the admin surface (`send_to_user`, `broadcast_to_room`).
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub event: &'a str,
    pub data: &'a Value,
}

impl<'a> Envelope<'a> {
    pub fn new(event: &'a str, data: &'a Value) -> Self {
        Self { event, data }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageContent, Timestamp};
    use serde_json::json;
    use std::collections::HashSet;

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_parse_join_room() {
        // テスト項目: join_room のエンベロープがルーム ID と種別にデコードされる
        // given (前提条件):
        let text = r#"{"event":"join_room","data":{"roomId":"city1","type":"city"}}"#;

        // when (操作):
        let event = ClientEvent::parse(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::JoinRoom(JoinRoomPayload {
                room_id: room("city1"),
                kind: RoomKind::City,
            })
        );
        assert_eq!(event.name(), EventName::JoinRoom);
    }

    #[test]
    fn test_parse_join_room_with_unknown_kind_fails() {
        // テスト項目: 未知のルーム種別を指定した join_room は形状エラーになる
        // given (前提条件):
        let text = r#"{"event":"join_room","data":{"roomId":"x","type":"castle"}}"#;

        // when (操作):
        let result = ClientEvent::parse(text);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_leave_room_accepts_both_shapes() {
        // テスト項目: leave_room は文字列とオブジェクトの両方の形式を受け付ける
        // given (前提条件):
        let bare = r#"{"event":"leave_room","data":"city1"}"#;
        let object = r#"{"event":"leave_room","data":{"roomId":"city1"}}"#;

        // when (操作):
        let from_bare = ClientEvent::parse(bare).unwrap();
        let from_object = ClientEvent::parse(object).unwrap();

        // then (期待する結果):
        for event in [from_bare, from_object] {
            let ClientEvent::LeaveRoom(payload) = event else {
                panic!("expected leave_room");
            };
            assert_eq!(payload.into_room_id(), room("city1"));
        }
    }

    #[test]
    fn test_parse_send_message_defaults_to_text() {
        // テスト項目: send_message の type を省略すると text になる
        // given (前提条件):
        let text = r#"{"event":"send_message","data":{"roomId":"global","message":{"content":"hi"}}}"#;

        // when (操作):
        let event = ClientEvent::parse(text).unwrap();

        // then (期待する結果):
        let ClientEvent::SendMessage(payload) = event else {
            panic!("expected send_message");
        };
        assert_eq!(payload.message.kind, MessageKind::Text);
        assert_eq!(payload.message.content, "hi");
    }

    #[test]
    fn test_parse_rejects_unknown_event_and_missing_fields() {
        // テスト項目: 未知のイベント名・必須フィールド欠落・JSON 以外はすべてエラーになる
        // given (前提条件):
        let inputs = [
            r#"{"event":"teleport","data":{}}"#,
            r#"{"event":"city_update","data":{"roomId":"c1"}}"#,
            r#"{"event":"score_updated","data":{"score":"lots"}}"#,
            "not json",
        ];

        // when (操作):
        let results: Vec<bool> = inputs
            .iter()
            .map(|text| ClientEvent::parse(text).is_err())
            .collect();

        // then (期待する結果):
        assert_eq!(results, vec![true, true, true, true]);
    }

    #[test]
    fn test_sample_value_for_amount_and_score() {
        // テスト項目: 量・スコアを持つイベントだけが監視用の数値を返す
        // given (前提条件):
        let collect = ClientEvent::parse(
            r#"{"event":"collect_resources","data":{"roomId":"c1","type":"gold","amount":25}}"#,
        )
        .unwrap();
        let score =
            ClientEvent::parse(r#"{"event":"score_updated","data":{"score":50}}"#).unwrap();
        let quest = ClientEvent::parse(
            r#"{"event":"quest_progress","data":{"questId":"q1","progress":3}}"#,
        )
        .unwrap();

        // when (操作) / then (期待する結果):
        assert_eq!(collect.sample_value(), Some(25.0));
        assert_eq!(score.sample_value(), Some(50.0));
        assert_eq!(quest.sample_value(), None);
    }

    #[test]
    fn test_event_names_are_distinct() {
        // テスト項目: EventName::ALL の名前はすべて異なる
        // given (前提条件) / when (操作):
        let names: HashSet<&str> = EventName::ALL.iter().map(EventName::as_str).collect();

        // then (期待する結果):
        assert_eq!(names.len(), EventName::ALL.len());
    }

    #[test]
    fn test_room_state_omits_absent_city() {
        // テスト項目: city が無い room_state は city キーを出力しない
        // given (前提条件):
        let event = ServerEvent::RoomState {
            room_id: room("guild1"),
            users: vec![],
            recent_messages: vec![],
            city: None,
        };

        // when (操作):
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "event": "room_state",
                "data": {"roomId": "guild1", "users": [], "recentMessages": []}
            })
        );
    }

    #[test]
    fn test_new_message_with_anonymous_sender() {
        // テスト項目: 匿名の送信者のメッセージは senderId が null になる
        // given (前提条件):
        let event = ServerEvent::NewMessage(ChatMessage {
            id: "m1".to_string(),
            sender_id: None,
            sender_name: "Anonymous".to_string(),
            content: MessageContent::new("hello".to_string()).unwrap(),
            kind: MessageKind::Text,
            timestamp: Timestamp::new(1000),
            room: room("global"),
        });

        // when (操作):
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(value["event"], "new_message");
        assert_eq!(value["data"]["senderId"], Value::Null);
        assert_eq!(value["data"]["senderName"], "Anonymous");
        assert_eq!(value["data"]["type"], "text");
    }

    #[test]
    fn test_envelope_wraps_custom_event() {
        // テスト項目: 任意のイベント名とペイロードをエンベロープに包める
        // given (前提条件):
        let data = json!({"text": "maintenance at noon"});

        // when (操作):
        let json = Envelope::new("announcement", &data).to_json().unwrap();

        // then (期待する結果):
        assert_eq!(
            serde_json::from_str::<Value>(&json).unwrap(),
            json!({"event": "announcement", "data": {"text": "maintenance at noon"}})
        );
    }
}
