//! UseCase: 都市・リソース・建物の中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - city_update / collect_resources / building_placed の中継
//! - city_update による都市スナップショットのキャッシュと分析カウンタの更新
//!
//! ### なぜこのテストが必要か
//! - 送信者自身にはエコーしないことを保証
//! - 後から参加した接続が最新の都市スナップショットを受け取れることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：同じルームの 2 接続間の中継
//! - 異常系：匿名接続による building_placed、キャッシュ障害

use std::sync::Arc;

use serde_json::Value;

use crate::{
    domain::{
        Connection, GameCache, RoomId,
        cache::{ANALYTICS_TTL, CITY_SNAPSHOT_TTL, keys},
    },
    infrastructure::dto::websocket::ServerEvent,
};

use super::{
    delivery::Delivery,
    error::{EventError, require_identity},
    monitor::MonitorUseCase,
};

const CITY_UPDATE_EVENT: &str = "city_update";

/// ゲームイベント中継のユースケース
pub struct GameEventUseCase {
    cache: Arc<dyn GameCache>,
    delivery: Arc<Delivery>,
    monitor: Arc<MonitorUseCase>,
}

impl GameEventUseCase {
    pub fn new(
        cache: Arc<dyn GameCache>,
        delivery: Arc<Delivery>,
        monitor: Arc<MonitorUseCase>,
    ) -> Self {
        Self {
            cache,
            delivery,
            monitor,
        }
    }

    /// 都市の更新をキャッシュし、送信者以外のルームメンバーへ中継する
    pub async fn city_update(
        &self,
        connection: &Connection,
        room_id: RoomId,
        city_data: Value,
    ) -> Result<usize, EventError> {
        let city_key = keys::city(&room_id);
        if let Err(e) = self
            .cache
            .set(&city_key, city_data.clone(), Some(CITY_SNAPSHOT_TTL))
            .await
        {
            tracing::warn!("Failed to cache city snapshot '{}': {}", city_key, e);
        }

        let analytics_key = keys::analytics(CITY_UPDATE_EVENT);
        if let Err(e) = self.cache.incr(&analytics_key, ANALYTICS_TTL).await {
            tracing::warn!("Failed to track '{}': {}", analytics_key, e);
        }

        if let Some(user_id) = connection.user_id() {
            self.monitor.observe_city(user_id, &city_data).await;
        }

        let json = ServerEvent::CityUpdated(city_data).to_json()?;
        Ok(self
            .delivery
            .to_room(&room_id, &json, Some(&connection.id))
            .await)
    }

    /// リソース回収を送信者以外のルームメンバーへ中継する
    pub async fn collect_resources(
        &self,
        connection: &Connection,
        room_id: RoomId,
        resource_type: String,
        amount: f64,
    ) -> Result<usize, EventError> {
        let event = ServerEvent::ResourcesCollected {
            user_id: connection.user_id().cloned(),
            resource_type,
            amount,
        };
        Ok(self
            .delivery
            .to_room(&room_id, &event.to_json()?, Some(&connection.id))
            .await)
    }

    /// 建物の配置を送信者以外のルームメンバーへ中継する（認証済みのみ）
    pub async fn building_placed(
        &self,
        connection: &Connection,
        room_id: RoomId,
        building: Value,
    ) -> Result<usize, EventError> {
        let identity = require_identity(connection)?;
        let event = ServerEvent::BuildingAdded {
            user_id: identity.user_id.clone(),
            building,
        };
        Ok(self
            .delivery
            .to_room(&room_id, &event.to_json()?, Some(&connection.id))
            .await)
    }
}
