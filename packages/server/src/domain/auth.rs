//! TokenVerifier trait 定義
//!
//! ハンドシェイク時のベアラートークンを身元情報に変換する外部サービスのインターフェース。

use super::{AuthError, Identity};

pub trait TokenVerifier: Send + Sync {
    /// トークンを検証し、身元情報を返す
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}
