//! Utilities shared across the Machiya workspace.

pub mod logger;
pub mod time;
