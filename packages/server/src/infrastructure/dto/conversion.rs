//! Conversion logic from domain entities to HTTP DTOs.

use machiya_shared::time::timestamp_to_rfc3339;

use crate::domain::{AnomalyRecord, Room, RoomMember, RoomSummary};
use crate::infrastructure::dto::http::{AnomalyDto, MemberDto, RoomDetailDto, RoomSummaryDto};

impl From<RoomSummary> for RoomSummaryDto {
    fn from(summary: RoomSummary) -> Self {
        Self {
            id: summary.id.into_string(),
            kind: summary.kind.as_str().to_string(),
            member_count: summary.member_count,
        }
    }
}

impl From<RoomMember> for MemberDto {
    fn from(member: RoomMember) -> Self {
        let (user_id, username) = match member.identity {
            Some(identity) => (Some(identity.user_id.into_string()), identity.username),
            None => (None, None),
        };
        Self {
            connection_id: member.connection_id.to_string(),
            user_id,
            username,
        }
    }
}

impl From<Room> for RoomDetailDto {
    fn from(room: Room) -> Self {
        Self {
            kind: room.kind.as_str().to_string(),
            member_count: room.member_count(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
            id: room.id.into_string(),
            members: room.members.into_iter().map(MemberDto::from).collect(),
        }
    }
}

impl From<AnomalyRecord> for AnomalyDto {
    fn from(record: AnomalyRecord) -> Self {
        Self {
            kind: record.kind.as_str().to_string(),
            detail: record.detail,
            user_id: record.user_id.into_string(),
            timestamp: timestamp_to_rfc3339(record.timestamp.value()),
        }
    }
}
