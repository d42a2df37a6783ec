use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewTicket, NewUser, Ticket, User};
use crate::filter::TicketFilter;

/// User directory. Ids are parsed before they reach the store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Users for the given ids, in the order of `ids`; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError>;

    /// Fails with [`DatabaseError::Duplicate`] if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(&self, ticket: NewTicket) -> Result<Ticket, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, DatabaseError>;

    /// Exact-match lookup in insertion order
    async fn find_by_filter(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, DatabaseError>;

    /// Replaces `status` and `assigned_users` of a stored ticket, provided its
    /// assignee list still equals `expected_assignees`. Returns `false` when the
    /// ticket changed (or vanished) since it was read.
    async fn save(&self, ticket: &Ticket, expected_assignees: &[Uuid]) -> Result<bool, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
