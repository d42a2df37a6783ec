// handlers/mod.rs - Handlers grouped by access tier
//
// Public (no auth) → Protected (bearer token, resolved user)
pub mod protected;
pub mod public;
