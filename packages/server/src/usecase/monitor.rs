//! UseCase: 行動ヒューリスティックによる異常検知
//!
//! BehaviorMonitor を共有状態として保持し、ルーターからの操作サンプルと
//! `city_update` のリソース観測値を受け取ります。検知結果は warn ログに記録し、
//! broadcast チャンネルで外部の購読者（モデレーション等）へ配信し、直近分を保持します。
//! 配信の遮断・切断は行いません。

use std::{collections::VecDeque, sync::Arc, time::Duration};

use machiya_shared::time::Clock;
use serde_json::Value;
use tokio::{
    sync::{Mutex, broadcast},
    task::JoinHandle,
    time::{Instant, interval_at},
};

use crate::domain::{AnomalyRecord, BehaviorMonitor, MonitorThresholds, Timestamp, UserId};

/// 保持する直近の検知件数
pub const RECENT_ANOMALY_CAPACITY: usize = 200;

const PUBLISH_CHANNEL_CAPACITY: usize = 256;

pub struct MonitorUseCase {
    monitor: Mutex<BehaviorMonitor>,
    recent: Mutex<VecDeque<AnomalyRecord>>,
    publisher: broadcast::Sender<AnomalyRecord>,
    clock: Arc<dyn Clock>,
}

impl MonitorUseCase {
    pub fn new(thresholds: MonitorThresholds, clock: Arc<dyn Clock>) -> Self {
        let (publisher, _) = broadcast::channel(PUBLISH_CHANNEL_CAPACITY);
        Self {
            monitor: Mutex::new(BehaviorMonitor::new(thresholds)),
            recent: Mutex::new(VecDeque::with_capacity(RECENT_ANOMALY_CAPACITY)),
            publisher,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// 認証済み接続の操作を 1 件記録する
    pub async fn record(&self, user_id: &UserId, action: &str, value: Option<f64>) {
        let now = self.now();
        self.monitor
            .lock()
            .await
            .record_action(user_id, action, value, now);
    }

    /// `cityData.resources` の数値フィールドを観測し、急増を判定する
    pub async fn observe_city(&self, user_id: &UserId, city_data: &Value) -> Vec<AnomalyRecord> {
        let Some(resources) = city_data.get("resources").and_then(Value::as_object) else {
            return Vec::new();
        };
        let now = self.now();
        let records: Vec<AnomalyRecord> = {
            let mut monitor = self.monitor.lock().await;
            resources
                .iter()
                .filter_map(|(name, value)| Some((name, value.as_f64()?)))
                .filter_map(|(name, value)| monitor.observe_resource(user_id, name, value, now))
                .collect()
        };
        self.emit(&records).await;
        records
    }

    /// 全ユーザーを評価する（サンプラーから定期的に呼ばれる）
    pub async fn sample(&self) -> Vec<AnomalyRecord> {
        let now = self.now();
        let records = self.monitor.lock().await.sample(now);
        self.emit(&records).await;
        records
    }

    /// 検知結果の購読を開始する
    pub fn subscribe(&self) -> broadcast::Receiver<AnomalyRecord> {
        self.publisher.subscribe()
    }

    /// 直近の検知結果（古い順）
    pub async fn recent_anomalies(&self) -> Vec<AnomalyRecord> {
        self.recent.lock().await.iter().cloned().collect()
    }

    async fn emit(&self, records: &[AnomalyRecord]) {
        if records.is_empty() {
            return;
        }
        let mut recent = self.recent.lock().await;
        for record in records {
            tracing::warn!(
                "Anomaly detected: kind={} user={} detail={}",
                record.kind,
                record.user_id,
                record.detail
            );
            // 購読者がいなくても記録は続ける
            let _ = self.publisher.send(record.clone());
            recent.push_back(record.clone());
            while recent.len() > RECENT_ANOMALY_CAPACITY {
                recent.pop_front();
            }
        }
    }

    /// 定期サンプラーを起動する（最初の評価は `period` 後）
    pub fn spawn_sampler(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let records = self.sample().await;
                tracing::debug!("Monitor sample produced {} anomaly record(s)", records.len());
            }
        })
    }
}
