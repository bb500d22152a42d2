//! ドメイン層
//!
//! エンティティ・値オブジェクトと、外部との境界になる trait（Repository /
//! ConnectionRegistry / GameCache / TokenVerifier）を定義します。

pub mod auth;
pub mod cache;
pub mod chat_history;
pub mod connection_registry;
pub mod entity;
pub mod error;
pub mod monitor;
pub mod repository;
pub mod value_object;

pub use auth::TokenVerifier;
pub use cache::GameCache;
pub use chat_history::{CHAT_HISTORY_CAPACITY, ChatHistory};
pub use connection_registry::{ConnectionRegistry, PusherChannel};
pub use entity::{
    AnomalyKind, AnomalyRecord, ChatMessage, Connection, Identity, LeaderboardEntry,
    MessageKind, Room, RoomKind, RoomMember, RoomSummary,
};
pub use error::{AuthError, CacheError, MessagePushError, ValueObjectError};
pub use monitor::{BehaviorMonitor, MonitorThresholds};
pub use repository::{RoomDeparture, RoomRepository};
pub use value_object::{ConnectionId, MessageContent, RoomId, Timestamp, UserId};
