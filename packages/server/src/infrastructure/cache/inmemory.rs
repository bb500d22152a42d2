//! インメモリ GameCache 実装
//!
//! 単一プロセスで動かす場合のキャッシュ。TTL は読み出し時に遅延評価で失効させ、
//! 書き込みのたびに失効済みのキーをまとめて削除する。
//! 時刻には `tokio::time::Instant` を使うため、`tokio::time::pause` を使ったテストで
//! 失効を再現できます。

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use tokio::{sync::Mutex, time::Instant};

use crate::domain::{CacheError, GameCache, LeaderboardEntry};

struct StoredValue {
    value: Value,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
struct Store {
    values: HashMap<String, StoredValue>,
    sorted_sets: HashMap<String, HashMap<String, f64>>,
}

impl Store {
    fn live_value(&mut self, key: &str, now: Instant) -> Option<&mut StoredValue> {
        if self
            .values
            .get(key)
            .is_some_and(|stored| stored.is_expired(now))
        {
            self.values.remove(key);
        }
        self.values.get_mut(key)
    }

    fn evict_expired(&mut self, now: Instant) {
        self.values.retain(|_, stored| !stored.is_expired(now));
    }
}

#[derive(Default)]
pub struct InMemoryGameCache {
    store: Mutex<Store>,
}

impl InMemoryGameCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameCache for InMemoryGameCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut store = self.store.lock().await;
        Ok(store
            .live_value(key, Instant::now())
            .map(|stored| stored.value.clone()))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut store = self.store.lock().await;
        let now = Instant::now();
        store.evict_expired(now);
        let expires_at = ttl.map(|ttl| now + ttl);
        store
            .values
            .insert(key.to_string(), StoredValue { value, expires_at });
        Ok(())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let mut store = self.store.lock().await;
        let now = Instant::now();
        store.evict_expired(now);
        match store.live_value(key, now) {
            Some(stored) => {
                let current = stored.value.as_i64().ok_or_else(|| CacheError::WrongType {
                    key: key.to_string(),
                })?;
                let next = current + 1;
                stored.value = Value::from(next);
                Ok(next)
            }
            None => {
                store.values.insert(
                    key.to_string(),
                    StoredValue {
                        value: Value::from(1),
                        expires_at: Some(now + ttl),
                    },
                );
                Ok(1)
            }
        }
    }

    async fn zincr(&self, key: &str, member: &str, delta: f64) -> Result<f64, CacheError> {
        let mut store = self.store.lock().await;
        let score = store
            .sorted_sets
            .entry(key.to_string())
            .or_default()
            .entry(member.to_string())
            .or_insert(0.0);
        *score += delta;
        Ok(*score)
    }

    async fn zrevrange(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<LeaderboardEntry>, CacheError> {
        let store = self.store.lock().await;
        let Some(set) = store.sorted_sets.get(key) else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<LeaderboardEntry> = set
            .iter()
            .map(|(member, score)| LeaderboardEntry {
                member: member.clone(),
                score: *score,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.member.cmp(&a.member))
        });
        Ok(entries
            .into_iter()
            .skip(start)
            .take(stop.saturating_sub(start).saturating_add(1))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_get() {
        // テスト項目: 設定した値を取得できる
        // given (前提条件):
        let cache = InMemoryGameCache::new();

        // when (操作):
        cache.set("city:c1", json!({"gold": 10}), None).await.unwrap();

        // then (期待する結果):
        assert_eq!(
            cache.get("city:c1").await.unwrap(),
            Some(json!({"gold": 10}))
        );
        assert_eq!(cache.get("city:missing").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_expires_after_ttl() {
        // テスト項目: TTL を過ぎた値は取得できない
        // given (前提条件):
        let cache = InMemoryGameCache::new();
        cache
            .set("city:c1", json!(1), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        // when (操作):
        tokio::time::advance(Duration::from_secs(59)).await;
        let before = cache.get("city:c1").await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        let after = cache.get("city:c1").await.unwrap();

        // then (期待する結果):
        assert_eq!(before, Some(json!(1)));
        assert_eq!(after, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_evicts_expired_keys() {
        // テスト項目: 書き込み時に、再び読まれない失効済みキーも削除される
        // given (前提条件):
        let cache = InMemoryGameCache::new();
        let ttl = Some(Duration::from_secs(60));
        for i in 0..1000 {
            cache.set(&format!("city:r{}", i), json!(i), ttl).await.unwrap();
        }
        cache.set("leaderboard:meta", json!("kept"), None).await.unwrap();

        // when (操作):
        tokio::time::advance(Duration::from_secs(3600)).await;
        cache.set("city:fresh", json!(1), ttl).await.unwrap();

        // then (期待する結果):
        assert_eq!(cache.store.lock().await.values.len(), 2);
        assert_eq!(cache.get("leaderboard:meta").await.unwrap(), Some(json!("kept")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_incr_sets_ttl_on_first_increment() {
        // テスト項目: カウンタは最初の増加時だけ TTL が設定され、失効後は 1 から数え直す
        // given (前提条件):
        let cache = InMemoryGameCache::new();
        let ttl = Duration::from_secs(10);

        // when (操作):
        let first = cache.incr("ratelimit:u1", ttl).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        let second = cache.incr("ratelimit:u1", ttl).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        let restarted = cache.incr("ratelimit:u1", ttl).await.unwrap();

        // then (期待する結果):
        assert_eq!((first, second, restarted), (1, 2, 1));
    }

    #[tokio::test]
    async fn test_incr_on_non_counter_is_wrong_type() {
        // テスト項目: 数値以外の値に対する incr は WrongType エラーになる
        // given (前提条件):
        let cache = InMemoryGameCache::new();
        cache.set("chat:r1", json!([]), None).await.unwrap();

        // when (操作):
        let result = cache.incr("chat:r1", Duration::from_secs(1)).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(CacheError::WrongType {
                key: "chat:r1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_leaderboard_range_is_descending() {
        // テスト項目: zrevrange はスコアの降順で指定範囲を返す
        // given (前提条件):
        let cache = InMemoryGameCache::new();
        cache.zincr("leaderboard:global", "u1", 50.0).await.unwrap();
        cache.zincr("leaderboard:global", "u2", 80.0).await.unwrap();
        let total = cache.zincr("leaderboard:global", "u1", 50.0).await.unwrap();
        cache.zincr("leaderboard:global", "u3", 10.0).await.unwrap();

        // when (操作):
        let top_two = cache.zrevrange("leaderboard:global", 0, 1).await.unwrap();

        // then (期待する結果):
        assert_eq!(total, 100.0);
        assert_eq!(
            top_two,
            vec![
                LeaderboardEntry {
                    member: "u1".to_string(),
                    score: 100.0
                },
                LeaderboardEntry {
                    member: "u2".to_string(),
                    score: 80.0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_leaderboard_range_of_missing_set_is_empty() {
        // テスト項目: 存在しないリーダーボードは空の範囲を返す
        // given (前提条件):
        let cache = InMemoryGameCache::new();

        // when (操作):
        let entries = cache.zrevrange("leaderboard:none", 0, 9).await.unwrap();

        // then (期待する結果):
        assert!(entries.is_empty());
    }
}
