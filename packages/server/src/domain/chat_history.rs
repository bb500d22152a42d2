//! ルームごとのチャット履歴（容量固定の FIFO）

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::entity::ChatMessage;

/// 1 ルームあたりに保持するメッセージ数
pub const CHAT_HISTORY_CAPACITY: usize = 100;

/// 直近のメッセージを保持するリングバッファ
///
/// 容量を超えると最も古いメッセージから捨てる。時間による失効はない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    messages: VecDeque<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// メッセージを追加し、溢れて捨てたメッセージを返す
    pub fn push(&mut self, message: ChatMessage) -> Vec<ChatMessage> {
        self.messages.push_back(message);
        let mut evicted = Vec::new();
        while self.messages.len() > CHAT_HISTORY_CAPACITY {
            if let Some(oldest) = self.messages.pop_front() {
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn into_vec(self) -> Vec<ChatMessage> {
        self.messages.into()
    }
}
