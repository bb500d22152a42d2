//! Real-time presence and broadcast core for the Machiya city-builder.
//!
//! Connections join named rooms, and game events are relayed to the right
//! audience: a room, a single user, or every connection.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
