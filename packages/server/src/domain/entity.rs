//! Entity 定義
//!
//! 接続・ルーム・チャットメッセージなど、リアルタイム層が扱うドメインモデル。

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{
    error::ValueObjectError,
    value_object::{ConnectionId, MessageContent, RoomId, Timestamp, UserId},
};

/// ハンドシェイクで付与される認証済みの身元情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub wallet_address: String,
    pub username: Option<String>,
}

impl Identity {
    pub fn new(user_id: UserId, wallet_address: String, username: Option<String>) -> Self {
        Self {
            user_id,
            wallet_address,
            username,
        }
    }

    /// 表示名（未設定の場合は `Anonymous`）
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(ANONYMOUS_NAME)
    }
}

/// 匿名送信者の表示名
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// 1 本のトランスポート接続
///
/// `identity` が `None` の接続は匿名（公開ルームの観戦・チャットのみ）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub identity: Option<Identity>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, identity: Option<Identity>, connected_at: Timestamp) -> Self {
        Self {
            id,
            identity,
            connected_at,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|identity| &identity.user_id)
    }

    pub fn is_identified(&self) -> bool {
        self.identity.is_some()
    }
}

/// ルーム種別
///
/// 最初に参加した接続が種別を決め、以降の参加で異なる種別が指定されても無視する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    City,
    Guild,
    Global,
    Trade,
}

impl RoomKind {
    pub const ALL: [RoomKind; 4] = [
        RoomKind::City,
        RoomKind::Guild,
        RoomKind::Global,
        RoomKind::Trade,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomKind::City => "city",
            RoomKind::Guild => "guild",
            RoomKind::Global => "global",
            RoomKind::Trade => "trade",
        }
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomKind {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValueObjectError::UnknownRoomKind(s.to_string()))
    }
}

/// ルームのメンバー（接続単位）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMember {
    pub connection_id: ConnectionId,
    pub identity: Option<Identity>,
}

impl From<&Connection> for RoomMember {
    fn from(connection: &Connection) -> Self {
        Self {
            connection_id: connection.id,
            identity: connection.identity.clone(),
        }
    }
}

/// Room エンティティ
///
/// メンバーは参加順に保持し、同じ接続が重複して入ることはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    pub members: Vec<RoomMember>,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, kind: RoomKind, created_at: Timestamp) -> Self {
        Self {
            id,
            kind,
            members: Vec::new(),
            created_at,
        }
    }

    /// メンバーを追加する。既に参加済みなら何もせず `false` を返す。
    pub fn add_member(&mut self, member: RoomMember) -> bool {
        if self.contains(&member.connection_id) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// メンバーを削除し、削除したメンバーを返す
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> Option<RoomMember> {
        let index = self
            .members
            .iter()
            .position(|member| &member.connection_id == connection_id)?;
        Some(self.members.remove(index))
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.members
            .iter()
            .any(|member| &member.connection_id == connection_id)
    }

    /// 認証済みメンバーの身元情報（参加順）
    pub fn identities(&self) -> Vec<Identity> {
        self.members
            .iter()
            .filter_map(|member| member.identity.clone())
            .collect()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.members
            .iter()
            .map(|member| member.connection_id)
            .collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// ルームの要約（管理 API 用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub kind: RoomKind,
    pub member_count: usize,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            kind: room.kind,
            member_count: room.member_count(),
        }
    }
}

/// チャットメッセージの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    System,
    Achievement,
    Trade,
}

/// ChatMessage エンティティ（作成後は不変）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: Option<UserId>,
    pub sender_name: String,
    pub content: MessageContent,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub timestamp: Timestamp,
    pub room: RoomId,
}

/// リーダーボードの 1 エントリ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub member: String,
    pub score: f64,
}

/// 異常検知の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    HighActivity,
    RepetitiveActions,
    SuspiciousGain,
    BotBehavior,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::HighActivity => "high_activity",
            AnomalyKind::RepetitiveActions => "repetitive_actions",
            AnomalyKind::SuspiciousGain => "suspicious_gain",
            AnomalyKind::BotBehavior => "bot_behavior",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 異常検知レコード（助言のみ。配信をブロックしない）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyRecord {
    pub kind: AnomalyKind,
    pub detail: String,
    pub user_id: UserId,
    pub timestamp: Timestamp,
}
