//! UseCase: リーダーボードの更新
//!
//! スコアの加算と上位の取得は外部キャッシュのソート済み集合に任せる。

use std::sync::Arc;

use crate::{
    domain::{
        Connection, GameCache,
        cache::{GLOBAL_LEADERBOARD, LEADERBOARD_TOP_N, keys},
    },
    infrastructure::dto::websocket::{ServerEvent, UpdatedUser},
};

use super::{
    delivery::Delivery,
    error::{EventError, require_identity},
};

pub struct LeaderboardUseCase {
    cache: Arc<dyn GameCache>,
    delivery: Arc<Delivery>,
}

impl LeaderboardUseCase {
    pub fn new(cache: Arc<dyn GameCache>, delivery: Arc<Delivery>) -> Self {
        Self { cache, delivery }
    }

    /// スコアを加算し、上位 10 件を全接続へ配信する
    ///
    /// # Returns
    ///
    /// 加算後の合計スコア（キャッシュ障害時は今回の加算値）
    pub async fn score_updated(
        &self,
        connection: &Connection,
        score: f64,
    ) -> Result<f64, EventError> {
        let identity = require_identity(connection)?;
        let key = keys::leaderboard(GLOBAL_LEADERBOARD);

        let new_score = self
            .cache
            .zincr(&key, identity.user_id.as_str(), score)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to update leaderboard '{}': {}", key, e);
                score
            });
        let entries = self
            .cache
            .zrevrange(&key, 0, LEADERBOARD_TOP_N - 1)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to read leaderboard '{}': {}", key, e);
                Vec::new()
            });

        let event = ServerEvent::LeaderboardUpdated {
            entries,
            updated_user: UpdatedUser {
                user_id: identity.user_id.clone(),
                username: identity.username.clone(),
                new_score,
            },
        };
        self.delivery.to_all(&event.to_json()?).await;
        Ok(new_score)
    }
}
