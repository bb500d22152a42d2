//! HTTP API endpoint handlers (read-only).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{AnomalyDto, HealthDto, RoomDetailDto, RoomSummaryDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        connections: state.room_admin_usecase.connection_count().await,
        rooms: state.room_admin_usecase.all_rooms().await.len(),
    })
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.room_admin_usecase.all_rooms().await;

    // Domain Model から DTO への変換
    Json(rooms.into_iter().map(RoomSummaryDto::from).collect())
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::NOT_FOUND)?;
    match state.room_admin_usecase.room_detail(&room_id).await {
        Some(room) => Ok(Json(RoomDetailDto::from(room))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Get recently flagged anomalies (oldest first)
pub async fn get_anomalies(State(state): State<Arc<AppState>>) -> Json<Vec<AnomalyDto>> {
    let records = state.monitor_usecase.recent_anomalies().await;
    Json(records.into_iter().map(AnomalyDto::from).collect())
}
