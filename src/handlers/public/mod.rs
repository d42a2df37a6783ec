// handlers/public/mod.rs - Endpoints reachable without a token
pub mod auth;
pub mod system;

pub use auth::{login_post, register_post};
pub use system::{health_get, root_get};
