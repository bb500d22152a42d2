//! GameCache の実装
//!
//! - `inmemory`: 単一プロセス用のインメモリ実装

pub mod inmemory;

pub use inmemory::InMemoryGameCache;
