//! GameCache trait 定義
//!
//! 最新の都市スナップショット、チャット履歴、リーダーボード、カウンタなど
//! 揮発性の状態を置く外部キー・バリューキャッシュのインターフェース。
//!
//! 読み込み → 更新 → 書き戻しの競合による更新の消失は許容する（チャット順序・
//! リーダーボード表示は厳密さを要求しない）。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{CacheError, LeaderboardEntry, RoomId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameCache: Send + Sync {
    /// 値を取得（存在しない・失効済みなら `None`）
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// 値を設定（`ttl` が `None` なら無期限）
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// カウンタを 1 増やす。最初の増加時に `ttl` を設定する。
    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheError>;

    /// ソート済み集合のメンバーのスコアを `delta` 増やし、増加後のスコアを返す
    async fn zincr(&self, key: &str, member: &str, delta: f64) -> Result<f64, CacheError>;

    /// スコアの降順で `start..=stop` の範囲を取得
    async fn zrevrange(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<LeaderboardEntry>, CacheError>;
}

/// キャッシュキーの命名規則
pub mod keys {
    use super::RoomId;

    pub fn city(room_id: &RoomId) -> String {
        format!("city:{}", room_id.as_str())
    }

    pub fn chat(room_id: &RoomId) -> String {
        format!("chat:{}", room_id.as_str())
    }

    pub fn leaderboard(name: &str) -> String {
        format!("leaderboard:{}", name)
    }

    pub fn analytics(event: &str) -> String {
        format!("analytics:{}", event)
    }
}

/// 都市スナップショットの保持期間
pub const CITY_SNAPSHOT_TTL: Duration = Duration::from_secs(60);
/// チャット履歴の保持期間
pub const CHAT_HISTORY_TTL: Duration = Duration::from_secs(86_400);
/// 分析カウンタの保持期間
pub const ANALYTICS_TTL: Duration = Duration::from_secs(86_400);
/// 全体リーダーボード名
pub const GLOBAL_LEADERBOARD: &str = "global";
/// `leaderboard_updated` で配信する上位件数
pub const LEADERBOARD_TOP_N: usize = 10;
