//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{Connection, Identity, ValueObjectError};

/// 1 件の受信イベントの処理失敗
///
/// ルーターはこのエラーをログに記録して破棄する。接続は維持される。
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event requires an identified connection")]
    Unidentified,

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ValueObjectError),

    #[error("failed to encode outbound event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 身元付き接続であることを要求する
pub(crate) fn require_identity(connection: &Connection) -> Result<&Identity, EventError> {
    connection.identity.as_ref().ok_or(EventError::Unidentified)
}
