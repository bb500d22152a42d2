//! UseCase テスト用の共通ヘルパー
//!
//! インメモリ実装で組み立てた依存関係と、接続ごとの受信チャンネルを提供します。

use std::sync::Arc;

use machiya_shared::time::ManualClock;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    domain::{Connection, ConnectionId, ConnectionRegistry, Identity, RoomId, Timestamp, UserId},
    infrastructure::{
        cache::InMemoryGameCache, connection_registry::WebSocketConnectionRegistry,
        repository::InMemoryRoomRepository,
    },
};

use super::delivery::Delivery;

// 2023-01-01 00:00:00 UTC
pub const START_MILLIS: i64 = 1_672_531_200_000;

pub struct TestContext {
    pub repository: Arc<InMemoryRoomRepository>,
    pub registry: Arc<WebSocketConnectionRegistry>,
    pub cache: Arc<InMemoryGameCache>,
    pub clock: Arc<ManualClock>,
    pub delivery: Arc<Delivery>,
}

impl TestContext {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let repository = Arc::new(InMemoryRoomRepository::new(clock.clone()));
        let registry = Arc::new(WebSocketConnectionRegistry::new());
        let delivery = Arc::new(Delivery::new(repository.clone(), registry.clone()));
        Self {
            repository,
            registry,
            cache: Arc::new(InMemoryGameCache::new()),
            clock,
            delivery,
        }
    }

    /// 接続を登録し、その接続宛ての受信チャンネルを返す
    pub async fn connect(&self, user: Option<&str>) -> (Connection, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Connection::new(
            ConnectionId::generate(),
            user.map(identity),
            Timestamp::new(START_MILLIS),
        );
        self.registry.register(connection.clone(), tx).await;
        (connection, rx)
    }
}

pub fn identity(user: &str) -> Identity {
    Identity::new(
        UserId::new(user.to_string()).unwrap(),
        format!("wallet-{}", user),
        Some(format!("{}-name", user)),
    )
}

pub fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub fn room(id: &str) -> RoomId {
    RoomId::new(id.to_string()).unwrap()
}

/// 受信済みのイベントをすべて取り出す
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut events = Vec::new();
    while let Ok(text) = rx.try_recv() {
        events.push(serde_json::from_str(&text).unwrap());
    }
    events
}

/// 受信済みのイベント名を取り出す
pub fn event_names(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    drain(rx)
        .into_iter()
        .map(|event| event["event"].as_str().unwrap_or_default().to_string())
        .collect()
}
