//! TokenVerifier の実装
//!
//! - `jwt`: HS256 JWT

pub mod jwt;

pub use jwt::{Claims, JwtVerifier};
