//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! `HashMap<RoomId, Room>` をインメモリのルームレジストリとして使用します。
//!
//! 全ての操作は 1 つの Mutex の中で完結するため、join / leave / leave_all は
//! 呼び出し単位で原子的に反映されます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use machiya_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, Identity, Room, RoomDeparture, RoomId, RoomKind, RoomMember, RoomRepository,
    Timestamp,
};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomId, Room>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

fn depart(
    rooms: &mut HashMap<RoomId, Room>,
    room_id: &RoomId,
    connection_id: &ConnectionId,
) -> Option<RoomDeparture> {
    let room = rooms.get_mut(room_id)?;
    let member = room.remove_member(connection_id)?;
    let remaining = room.members.clone();
    let room_deleted = room.is_empty();
    if room_deleted {
        rooms.remove(room_id);
        tracing::debug!("Room '{}' is empty and has been removed", room_id);
    }
    Some(RoomDeparture {
        room_id: room_id.clone(),
        member,
        remaining,
        room_deleted,
    })
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn join(&self, room_id: RoomId, kind: RoomKind, member: RoomMember) -> Room {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.entry(room_id.clone()).or_insert_with(|| {
            tracing::debug!("Room '{}' created with kind '{}'", room_id, kind);
            Room::new(room_id.clone(), kind, Timestamp::new(self.clock.now_millis()))
        });
        if room.kind != kind {
            tracing::debug!(
                "Ignoring kind '{}' for room '{}' (already '{}')",
                kind,
                room.id,
                room.kind
            );
        }
        room.add_member(member);
        room.clone()
    }

    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<RoomDeparture> {
        let mut rooms = self.rooms.lock().await;
        depart(&mut rooms, room_id, connection_id)
    }

    async fn leave_all(&self, connection_id: &ConnectionId) -> Vec<RoomDeparture> {
        let mut rooms = self.rooms.lock().await;
        let mut joined: Vec<RoomId> = rooms
            .values()
            .filter(|room| room.contains(connection_id))
            .map(|room| room.id.clone())
            .collect();
        joined.sort();
        joined
            .iter()
            .filter_map(|room_id| depart(&mut rooms, room_id, connection_id))
            .collect()
    }

    async fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).cloned()
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        let mut list: Vec<Room> = rooms.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    async fn members_of(&self, room_id: &RoomId) -> Vec<Identity> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map(Room::identities).unwrap_or_default()
    }

    async fn member_connections(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .map(Room::connection_ids)
            .unwrap_or_default()
    }
}
