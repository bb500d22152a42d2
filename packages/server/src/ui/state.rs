//! Server state and dependency wiring.

use std::sync::Arc;

use machiya_shared::time::Clock;

use crate::{
    domain::{ConnectionRegistry, GameCache, MonitorThresholds, RoomRepository, TokenVerifier},
    infrastructure::{
        cache::InMemoryGameCache, connection_registry::WebSocketConnectionRegistry,
        repository::InMemoryRoomRepository,
    },
    usecase::{
        ChatHistoryStore, ConnectParticipantUseCase, Delivery, DisconnectParticipantUseCase,
        GameEventUseCase, HeartbeatUseCase, LeaderboardUseCase, MonitorUseCase, QuestUseCase,
        RoomAdminUseCase, RoomMembershipUseCase, SendMessageUseCase, TradeUseCase,
    },
};

use super::router::EventRouter;

/// 外部との境界になる実装の組
pub struct Dependencies {
    /// Repository（ルーム管理の抽象化）
    pub repository: Arc<dyn RoomRepository>,
    /// ConnectionRegistry（接続管理の抽象化）
    pub registry: Arc<dyn ConnectionRegistry>,
    /// GameCache（外部キャッシュの抽象化）
    pub cache: Arc<dyn GameCache>,
    /// TokenVerifier（ハンドシェイク時の認証）
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub clock: Arc<dyn Clock>,
    pub thresholds: MonitorThresholds,
}

impl Dependencies {
    /// 単一プロセス用のインメモリ実装で組み立てる
    pub fn in_memory(token_verifier: Arc<dyn TokenVerifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository: Arc::new(InMemoryRoomRepository::new(clock.clone())),
            registry: Arc::new(WebSocketConnectionRegistry::new()),
            cache: Arc::new(InMemoryGameCache::new()),
            token_verifier,
            clock,
            thresholds: MonitorThresholds::default(),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub token_verifier: Arc<dyn TokenVerifier>,
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// 受信イベントの振り分け
    pub event_router: Arc<EventRouter>,
    /// RoomAdminUseCase（管理・参照のユースケース）
    pub room_admin_usecase: Arc<RoomAdminUseCase>,
    pub monitor_usecase: Arc<MonitorUseCase>,
    pub heartbeat_usecase: Arc<HeartbeatUseCase>,
}

impl AppState {
    pub fn new(deps: Dependencies) -> Self {
        let Dependencies {
            repository,
            registry,
            cache,
            token_verifier,
            clock,
            thresholds,
        } = deps;

        let delivery = Arc::new(Delivery::new(repository.clone(), registry.clone()));
        let history = Arc::new(ChatHistoryStore::new(cache.clone()));
        let monitor_usecase = Arc::new(MonitorUseCase::new(thresholds, clock.clone()));

        let event_router = Arc::new(EventRouter {
            room_membership_usecase: Arc::new(RoomMembershipUseCase::new(
                repository.clone(),
                cache.clone(),
                history.clone(),
                delivery.clone(),
            )),
            game_event_usecase: Arc::new(GameEventUseCase::new(
                cache.clone(),
                delivery.clone(),
                monitor_usecase.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                history,
                delivery.clone(),
                clock.clone(),
            )),
            trade_usecase: Arc::new(TradeUseCase::new(delivery.clone())),
            quest_usecase: Arc::new(QuestUseCase::new(delivery.clone())),
            leaderboard_usecase: Arc::new(LeaderboardUseCase::new(cache, delivery.clone())),
            monitor_usecase: monitor_usecase.clone(),
        });

        Self {
            token_verifier,
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                registry.clone(),
                clock.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                repository.clone(),
                registry.clone(),
                delivery.clone(),
            )),
            event_router,
            room_admin_usecase: Arc::new(RoomAdminUseCase::new(
                repository,
                registry.clone(),
                delivery,
            )),
            monitor_usecase,
            heartbeat_usecase: Arc::new(HeartbeatUseCase::new(registry, clock)),
        }
    }
}
