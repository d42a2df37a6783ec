// handlers/protected/mod.rs - Endpoints behind jwt_auth_middleware
//
// Every handler here can rely on an `AuthUser` request extension.
pub mod tickets;

pub use tickets::{analytics_get, assign_post, ticket_get, ticket_post};
