//! Repository trait 定義
//!
//! ドメイン層が必要とするルーム状態へのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ConnectionId, Identity, Room, RoomId, RoomKind, RoomMember};

/// ルームからの退出結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDeparture {
    pub room_id: RoomId,
    /// 退出したメンバー
    pub member: RoomMember,
    /// 退出後に残ったメンバー（参加順）
    pub remaining: Vec<RoomMember>,
    /// メンバーが空になりルームを削除したか
    pub room_deleted: bool,
}

impl RoomDeparture {
    pub fn remaining_connections(&self) -> Vec<ConnectionId> {
        self.remaining
            .iter()
            .map(|member| member.connection_id)
            .collect()
    }

    pub fn remaining_identities(&self) -> Vec<Identity> {
        self.remaining
            .iter()
            .filter_map(|member| member.identity.clone())
            .collect()
    }
}

/// Room Repository trait
///
/// 各操作は 1 回のロック内で完結し、呼び出し単位で原子的に反映される。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームに参加する。ルームが無ければ `kind` で作成する。
    ///
    /// 既存ルームの種別とは異なる `kind` は無視する。参加後のスナップショットを返す。
    async fn join(&self, room_id: RoomId, kind: RoomKind, member: RoomMember) -> Room;

    /// ルームから退出する。ルームまたはメンバーが存在しなければ `None`。
    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<RoomDeparture>;

    /// 接続が属する全てのルームから退出する（切断時）
    async fn leave_all(&self, connection_id: &ConnectionId) -> Vec<RoomDeparture>;

    /// ルームのスナップショットを取得
    async fn get_room(&self, room_id: &RoomId) -> Option<Room>;

    /// 全ルームのスナップショットを取得（ID 順）
    async fn list_rooms(&self) -> Vec<Room>;

    /// ルームの認証済みメンバーの身元情報（参加順）
    async fn members_of(&self, room_id: &RoomId) -> Vec<Identity>;

    /// ルームに属する接続 ID の一覧
    async fn member_connections(&self, room_id: &RoomId) -> Vec<ConnectionId>;
}
