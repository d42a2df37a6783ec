pub mod ticket_service;
pub mod user_service;

pub use ticket_service::{TicketAnalytics, TicketDetails, TicketError, TicketService};
pub use user_service::{LoginResponse, UserError, UserService};
