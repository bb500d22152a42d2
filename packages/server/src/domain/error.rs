//! ドメイン層のエラー型

use thiserror::Error;

/// Value Object の生成に失敗した場合のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    UserIdEmpty,

    #[error("user id must be at most {0} bytes")]
    UserIdTooLong(usize),

    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("room id must be at most {0} bytes")]
    RoomIdTooLong(usize),

    #[error("message content must contain a non-whitespace character")]
    MessageContentEmpty,

    #[error("message content must be at most {0} characters")]
    MessageContentTooLong(usize),

    #[error("unknown room kind '{0}'")]
    UnknownRoomKind(String),
}

/// クライアントへの送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 対象の接続が存在しない（切断済み・未登録）
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    /// 送信チャンネルが閉じている
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// 外部キャッシュの操作エラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("value stored at '{key}' has an unexpected type")]
    WrongType { key: String },
}

/// ハンドシェイク時のトークン検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("malformed token")]
    Malformed,

    #[error("unsupported token algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("invalid token claims: {0}")]
    InvalidClaims(String),
}
