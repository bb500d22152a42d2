//! UseCase: 生存確認用の heartbeat 配信
//!
//! ルームとは無関係に全接続へ一定間隔で `heartbeat {timestamp}` を送る。
//! クライアントは遅延の推定にのみ使い、サーバー側は受信確認を行わない。

use std::{sync::Arc, time::Duration};

use machiya_shared::time::Clock;
use tokio::{
    task::JoinHandle,
    time::{Instant, interval_at},
};

use crate::{domain::ConnectionRegistry, infrastructure::dto::websocket::ServerEvent};

use super::error::EventError;

pub struct HeartbeatUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl HeartbeatUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// heartbeat を 1 回配信し、届いた接続数を返す
    pub async fn beat(&self) -> Result<usize, EventError> {
        let event = ServerEvent::Heartbeat {
            timestamp: self.clock.now_millis(),
        };
        Ok(self.registry.broadcast_all(&event.to_json()?).await)
    }

    /// 定期配信タスクを起動する（最初の配信は `period` 後）
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                match self.beat().await {
                    Ok(delivered) => tracing::debug!("Heartbeat sent to {} connection(s)", delivered),
                    Err(e) => tracing::warn!("Failed to send heartbeat: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{START_MILLIS, TestContext, drain};
    use serde_json::json;

    #[tokio::test]
    async fn test_beat_reaches_every_connection() {
        // テスト項目: heartbeat はルームに参加していない匿名接続にも届く
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = HeartbeatUseCase::new(ctx.registry.clone(), ctx.clock.clone());
        let (_alice, mut alice_rx) = ctx.connect(Some("u1")).await;
        let (_spectator, mut spectator_rx) = ctx.connect(None).await;

        // when (操作):
        let delivered = usecase.beat().await.unwrap();

        // then (期待する結果):
        assert_eq!(delivered, 2);
        let expected = json!({"event": "heartbeat", "data": {"timestamp": START_MILLIS}});
        assert_eq!(drain(&mut alice_rx), vec![expected.clone()]);
        assert_eq!(drain(&mut spectator_rx), vec![expected]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_heartbeat_waits_one_period() {
        // テスト項目: 定期配信は起動直後ではなく 1 周期後から始まる
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = Arc::new(HeartbeatUseCase::new(ctx.registry.clone(), ctx.clock.clone()));
        let (_alice, mut rx) = ctx.connect(Some("u1")).await;

        // when (操作):
        let handle = usecase.spawn(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(29)).await;
        let before = drain(&mut rx).len();
        let first = rx.recv().await;
        handle.abort();

        // then (期待する結果):
        assert_eq!(before, 0);
        assert!(first.is_some());
    }
}
