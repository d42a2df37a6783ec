pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{MemoryTicketStore, MemoryUserStore};
pub use postgres::{PgTicketStore, PgUserStore};
pub use repository::{TicketStore, UserStore};
