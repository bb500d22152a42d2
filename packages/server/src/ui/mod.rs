//! Real-time game server (WebSocket endpoint and HTTP API).

mod handler;
pub mod router;
mod server;
mod signal;
pub mod state;

pub use router::{DispatchError, EventRouter};
pub use server::{Server, ServerError, ServerSettings};
pub use state::{AppState, Dependencies};
