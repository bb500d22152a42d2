//! ConnectionRegistry trait 定義
//!
//! ## 責務
//!
//! - 接続 ID と送信チャンネルの対応を管理
//! - 認証済みユーザー ID → 接続 ID の対応を管理（1 ユーザーにつき最新の 1 接続）
//! - 接続単位の送信（push_to）と複数接続への送信（broadcast）
//!
//! ルームのメンバー管理には関与しない。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Connection, ConnectionId, MessagePushError, UserId};

/// クライアントへのメッセージ送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 接続を登録する
    ///
    /// 身元付きの接続は `UserId` → 接続の対応も更新する（後勝ち）。
    /// 置き換えられた古い接続は切断しない。
    async fn register(&self, connection: Connection, sender: PusherChannel);

    /// 接続を登録解除する（トランスポート切断時に 1 回だけ呼ばれる）
    ///
    /// `UserId` の対応は、それがまだこの接続を指している場合にのみ削除する。
    async fn unregister(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// ユーザーの現在の接続を解決する
    async fn resolve(&self, user_id: &UserId) -> Option<ConnectionId>;

    /// 接続がまだ生きているか
    async fn is_connected(&self, connection_id: &ConnectionId) -> bool;

    /// 特定の接続に送信する
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続に送信する。一部の送信失敗は許容し、配送できた数を返す。
    async fn broadcast(&self, targets: &[ConnectionId], content: &str) -> usize;

    /// 全ての接続に送信し、配送できた数を返す
    async fn broadcast_all(&self, content: &str) -> usize;

    /// 接続数
    async fn connection_count(&self) -> usize;
}
