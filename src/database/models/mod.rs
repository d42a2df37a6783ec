pub mod ticket;
pub mod user;

pub use ticket::{NewTicket, Ticket, TicketRow, MAX_ASSIGNED_USERS};
pub use user::{NewUser, User, UserSummary};

use uuid::Uuid;

/// Parse a client-supplied identifier. Stores only ever see parsed ids.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
