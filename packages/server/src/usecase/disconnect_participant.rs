//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 全ルームからの退出、退出通知、ConnectionRegistry からの登録解除
//!
//! ### なぜこのテストが必要か
//! - 閉じた接続がルームのメンバーに残らないことを保証
//! - 他のメンバーの集合に影響しないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数ルームに参加した接続の切断
//! - エッジケース：どのルームにも参加していない接続、置き換え済み接続の切断

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, RoomDeparture, RoomRepository};

use super::{delivery::Delivery, room_membership::announce_departure};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// ConnectionRegistry（接続管理の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    delivery: Arc<Delivery>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
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

    /// 参加者切断を実行
    ///
    /// トランスポートが閉じたときに 1 度だけ呼ばれる。参加中の全ルームから退出し、
    /// 残りのメンバーへ user_left を送ったうえで登録を解除する。
    ///
    /// # Returns
    ///
    /// 退出したルームごとの結果（ルーム ID 順）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Vec<RoomDeparture> {
        let departures = self.repository.leave_all(connection_id).await;
        for departure in &departures {
            if let Err(e) = announce_departure(&self.delivery, departure).await {
                tracing::warn!(
                    "Failed to announce departure from '{}': {}",
                    departure.room_id,
                    e
                );
            }
        }

        if self.registry.unregister(connection_id).await.is_none() {
            tracing::debug!("Connection '{}' was not registered", connection_id);
        }
        tracing::info!(
            "Client disconnected: {} (left {} room(s))",
            connection_id,
            departures.len()
        );
        departures
    }
}
