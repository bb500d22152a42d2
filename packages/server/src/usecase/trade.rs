//! UseCase: トレード通知の中継
//!
//! トレードの状態遷移は外部ストアが持つ。ここでは作成・成立の通知を相手の接続と
//! `global` ルームへ中継するだけ。

use std::sync::Arc;

use serde_json::Value;

use crate::{
    domain::{Connection, RoomId, UserId},
    infrastructure::dto::websocket::ServerEvent,
};

use super::{
    delivery::Delivery,
    error::{EventError, require_identity},
};

pub struct TradeUseCase {
    delivery: Arc<Delivery>,
}

impl TradeUseCase {
    pub fn new(delivery: Arc<Delivery>) -> Self {
        Self { delivery }
    }

    /// トレードの申し込み
    ///
    /// 相手がオンラインなら trade_received を直接送り、`global` ルームには常に
    /// trade_created を送る。
    ///
    /// # Returns
    ///
    /// 相手に直接届いたかどうか
    pub async fn offer(
        &self,
        connection: &Connection,
        trade_id: String,
        to_user_id: &UserId,
        offer: Value,
        request: Option<Value>,
    ) -> Result<bool, EventError> {
        let from_user = require_identity(connection)?;

        let received = ServerEvent::TradeReceived {
            trade_id: trade_id.clone(),
            offer,
            request,
            from_user: from_user.clone(),
        };
        let delivered = self.delivery.to_user(to_user_id, &received.to_json()?).await;
        if !delivered {
            tracing::debug!(
                "Trade '{}' recipient '{}' is offline",
                trade_id,
                to_user_id
            );
        }

        let created = ServerEvent::TradeCreated {
            trade_id,
            from_user: from_user.clone(),
        };
        self.delivery
            .to_room(&RoomId::global(), &created.to_json()?, None)
            .await;
        Ok(delivered)
    }

    /// トレードの成立を双方に通知する
    ///
    /// # Returns
    ///
    /// trade_completed が届いた接続数
    pub async fn accept(
        &self,
        connection: &Connection,
        trade_id: String,
        from_user_id: &UserId,
    ) -> Result<usize, EventError> {
        let accepter = require_identity(connection)?;
        let json = ServerEvent::TradeCompleted { trade_id }.to_json()?;

        let mut delivered = usize::from(self.delivery.to_user(from_user_id, &json).await);
        if from_user_id != &accepter.user_id {
            delivered += usize::from(self.delivery.to_user(&accepter.user_id, &json).await);
        }
        Ok(delivered)
    }
}
