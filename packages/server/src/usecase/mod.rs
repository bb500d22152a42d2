//! UseCase 層
//!
//! 受信イベントごとの処理と、配送先（接続・ルーム・全体）の解決を担います。
//! 外部との境界は domain 層の trait 越しにのみ扱います。

pub mod connect_participant;
pub mod delivery;
pub mod disconnect_participant;
pub mod error;
pub mod game_event;
pub mod heartbeat;
pub mod leaderboard;
pub mod monitor;
pub mod quest;
pub mod room_admin;
pub mod room_membership;
pub mod send_message;
pub mod trade;

#[cfg(test)]
mod test_support;

pub use connect_participant::ConnectParticipantUseCase;
pub use delivery::Delivery;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::EventError;
pub use game_event::GameEventUseCase;
pub use heartbeat::HeartbeatUseCase;
pub use leaderboard::LeaderboardUseCase;
pub use monitor::MonitorUseCase;
pub use quest::QuestUseCase;
pub use room_admin::RoomAdminUseCase;
pub use room_membership::RoomMembershipUseCase;
pub use send_message::{ChatHistoryStore, SendMessageUseCase};
pub use trade::TradeUseCase;
