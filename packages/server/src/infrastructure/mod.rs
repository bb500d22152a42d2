//! インフラストラクチャ層
//!
//! ドメイン層の trait の具体的な実装と、ワイヤーフォーマット（DTO）を提供します。

pub mod auth;
pub mod cache;
pub mod connection_registry;
pub mod dto;
pub mod repository;
