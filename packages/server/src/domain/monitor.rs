//! 行動ヒューリスティックによる異常検知
//!
//! 認証済みユーザーごとに直近の操作サンプルを保持し、頻度・偏り・リソースの急増を
//! 判定する。判定結果は助言（`AnomalyRecord`）であり、配信の遮断や切断は行わない。

use std::collections::{HashMap, VecDeque};

use super::{AnomalyKind, AnomalyRecord, Timestamp, UserId};

/// 判定しきい値
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorThresholds {
    /// 集計ウィンドウ（ミリ秒）
    pub window_millis: i64,
    /// ウィンドウ内の総操作数の上限
    pub max_actions_per_window: usize,
    /// ウィンドウ内で同一種別の操作数の上限
    pub max_same_action_per_window: usize,
    /// 連続する観測値の増加倍率の上限
    pub max_resource_increase_ratio: f64,
    /// タイミング判定を行う最小サンプル数
    pub bot_min_samples: usize,
    /// 平均操作間隔がこれ未満なら機械的とみなす（ミリ秒）
    pub bot_min_mean_interval_millis: f64,
    /// 値付きサンプルのうち 100 の倍数が占める割合の上限
    pub max_round_value_ratio: f64,
    /// ユーザーごとに保持するサンプル数の上限
    pub max_samples_per_user: usize,
    /// ユーザーごとに追跡するリソース名の上限
    pub max_resources_per_user: usize,
}

impl Default for MonitorThresholds {
    fn default() -> Self {
        Self {
            window_millis: 60_000,
            max_actions_per_window: 120,
            max_same_action_per_window: 50,
            max_resource_increase_ratio: 10.0,
            bot_min_samples: 100,
            bot_min_mean_interval_millis: 100.0,
            max_round_value_ratio: 0.8,
            max_samples_per_user: 1000,
            max_resources_per_user: 32,
        }
    }
}

/// 1 件の操作サンプル
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSample {
    pub action: String,
    pub value: Option<f64>,
    pub timestamp: Timestamp,
}

impl ActionSample {
    /// 0 以外の 100 の倍数か
    fn is_round_value(&self) -> bool {
        self.value
            .is_some_and(|value| value != 0.0 && value.is_finite() && value % 100.0 == 0.0)
    }
}

/// ユーザーごとのリソース観測値
#[derive(Debug, Default)]
struct ResourceTrack {
    values: HashMap<String, f64>,
    last_seen: i64,
}

#[derive(Debug, Default)]
pub struct BehaviorMonitor {
    thresholds: MonitorThresholds,
    samples: HashMap<UserId, VecDeque<ActionSample>>,
    resources: HashMap<UserId, ResourceTrack>,
}

impl BehaviorMonitor {
    pub fn new(thresholds: MonitorThresholds) -> Self {
        Self {
            thresholds,
            samples: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    pub fn thresholds(&self) -> &MonitorThresholds {
        &self.thresholds
    }

    /// 操作サンプルを記録する（上限を超えたら古いものから捨てる）
    pub fn record_action(
        &mut self,
        user_id: &UserId,
        action: &str,
        value: Option<f64>,
        now: Timestamp,
    ) {
        let max = self.thresholds.max_samples_per_user;
        let samples = self.samples.entry(user_id.clone()).or_default();
        samples.push_back(ActionSample {
            action: action.to_string(),
            value,
            timestamp: now,
        });
        while samples.len() > max {
            samples.pop_front();
        }
    }

    /// リソースの観測値を記録し、直前の観測値からの急増を判定する
    ///
    /// 追跡中のリソース名が上限に達したユーザーの新しい名前は無視する。
    pub fn observe_resource(
        &mut self,
        user_id: &UserId,
        resource: &str,
        value: f64,
        now: Timestamp,
    ) -> Option<AnomalyRecord> {
        if !value.is_finite() {
            return None;
        }
        let max_resources = self.thresholds.max_resources_per_user;
        let track = self.resources.entry(user_id.clone()).or_default();
        track.last_seen = now.value();
        let previous = match track.values.get_mut(resource) {
            Some(previous) => std::mem::replace(previous, value),
            None => {
                if track.values.len() < max_resources {
                    track.values.insert(resource.to_string(), value);
                }
                return None;
            }
        };
        if previous <= 0.0 {
            return None;
        }
        let ratio = value / previous;
        (ratio > self.thresholds.max_resource_increase_ratio).then(|| AnomalyRecord {
            kind: AnomalyKind::SuspiciousGain,
            detail: format!("{} increased {:.1}x", resource, ratio),
            user_id: user_id.clone(),
            timestamp: now,
        })
    }

    /// 1 ユーザーの直近ウィンドウを評価する
    pub fn evaluate(&self, user_id: &UserId, now: Timestamp) -> Vec<AnomalyRecord> {
        let Some(samples) = self.samples.get(user_id) else {
            return Vec::new();
        };
        let window_start = now.value() - self.thresholds.window_millis;
        let recent: Vec<&ActionSample> = samples
            .iter()
            .filter(|sample| sample.timestamp.value() > window_start)
            .collect();

        let mut anomalies = Vec::new();
        let record = |kind: AnomalyKind, detail: String| AnomalyRecord {
            kind,
            detail,
            user_id: user_id.clone(),
            timestamp: now,
        };

        if recent.len() > self.thresholds.max_actions_per_window {
            anomalies.push(record(
                AnomalyKind::HighActivity,
                format!("High activity: {}/min", recent.len()),
            ));
        }

        if let Some((action, count)) = most_frequent_action(&recent)
            && count > self.thresholds.max_same_action_per_window
        {
            anomalies.push(record(
                AnomalyKind::RepetitiveActions,
                format!("Repetitive {}: {}/min", action, count),
            ));
        }

        if recent.len() > self.thresholds.bot_min_samples {
            let mut factors = Vec::new();
            if let Some(mean) = mean_interval_millis(&recent)
                && mean > 0.0
                && mean < self.thresholds.bot_min_mean_interval_millis
            {
                factors.push(format!("Too consistent: mean interval {:.1}ms", mean));
            }
            let round = recent.iter().filter(|sample| sample.is_round_value()).count();
            let round_ratio = round as f64 / recent.len() as f64;
            if round_ratio > self.thresholds.max_round_value_ratio {
                factors.push(format!("Suspicious round numbers: {:.0}%", round_ratio * 100.0));
            }
            if !factors.is_empty() {
                anomalies.push(record(AnomalyKind::BotBehavior, factors.join(", ")));
            }
        }

        anomalies
    }

    /// 全ユーザーを評価し、ウィンドウ内に記録の無いユーザーを破棄する
    pub fn sample(&mut self, now: Timestamp) -> Vec<AnomalyRecord> {
        let window_start = now.value() - self.thresholds.window_millis;
        self.samples.retain(|_, samples| {
            samples
                .back()
                .is_some_and(|sample| sample.timestamp.value() > window_start)
        });
        self.resources.retain(|_, track| track.last_seen > window_start);

        let mut user_ids: Vec<UserId> = self.samples.keys().cloned().collect();
        user_ids.sort();
        user_ids
            .iter()
            .flat_map(|user_id| self.evaluate(user_id, now))
            .collect()
    }

    /// ユーザーのサンプル数（テスト・診断用）
    pub fn sample_count(&self, user_id: &UserId) -> usize {
        self.samples.get(user_id).map_or(0, VecDeque::len)
    }

    pub fn tracked_users(&self) -> usize {
        self.samples.len()
    }

    /// 追跡中のリソース名の総数（テスト・診断用）
    pub fn tracked_resources(&self) -> usize {
        self.resources.values().map(|track| track.values.len()).sum()
    }
}

fn most_frequent_action<'a>(samples: &[&'a ActionSample]) -> Option<(&'a str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for sample in samples {
        *counts.entry(sample.action.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_name, a_count), (b_name, b_count)| {
            a_count.cmp(b_count).then_with(|| b_name.cmp(a_name))
        })
}

fn mean_interval_millis(samples: &[&ActionSample]) -> Option<f64> {
    let first = samples.first()?.timestamp.value();
    let last = samples.last()?.timestamp.value();
    if samples.len() < 2 {
        return None;
    }
    Some((last - first) as f64 / (samples.len() - 1) as f64)
}
