//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続の生成と ConnectionRegistry への登録
//!
//! ### なぜこのテストが必要か
//! - 身元付き接続は UserId から直接配送の宛先として解決できる必要がある
//! - 匿名接続も登録され、全体ブロードキャスト（heartbeat 等）を受け取れる必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：身元付き接続・匿名接続
//! - エッジケース：同じユーザーの 2 本目の接続（後勝ち）

use std::sync::Arc;

use machiya_shared::time::Clock;

use crate::domain::{
    Connection, ConnectionId, ConnectionRegistry, Identity, PusherChannel, Timestamp,
};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// ConnectionRegistry（接続管理の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `identity` - ハンドシェイクで検証された身元情報（匿名なら `None`）
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// 新しく払い出した接続（Domain Model）
    pub async fn execute(&self, identity: Option<Identity>, sender: PusherChannel) -> Connection {
        let connection = Connection::new(
            ConnectionId::generate(),
            identity,
            Timestamp::new(self.clock.now_millis()),
        );
        self.registry.register(connection.clone(), sender).await;

        match connection.user_id() {
            Some(user_id) => tracing::info!(
                "Client connected: {} (user '{}')",
                connection.id,
                user_id
            ),
            None => tracing::info!("Client connected: {} (anonymous)", connection.id),
        }
        connection
    }
}
