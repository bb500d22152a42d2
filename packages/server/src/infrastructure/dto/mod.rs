//! Data Transfer Objects (DTOs) for the real-time server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket event envelopes (inbound and outbound)
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
