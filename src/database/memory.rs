use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewTicket, NewUser, Ticket, User};
use crate::database::repository::{TicketStore, UserStore};
use crate::filter::TicketFilter;

/// In-process user directory for tests and `--store memory`
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| users.iter().find(|u| u.id == *id).cloned())
            .collect())
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        // Check and insert under one write lock so concurrent registrations serialise
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::Duplicate(format!("email {}", user.email)));
        }

        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password: user.password_hash,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record)
    }
}

#[derive(Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<Vec<Ticket>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn create(&self, ticket: NewTicket) -> Result<Ticket, DatabaseError> {
        let record = ticket.into_ticket(Uuid::new_v4());
        self.tickets.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, DatabaseError> {
        let tickets = self.tickets.read().await;
        Ok(tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_filter(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, DatabaseError> {
        let tickets = self.tickets.read().await;
        Ok(tickets.iter().filter(|t| filter.matches(t)).cloned().collect())
    }

    async fn save(&self, ticket: &Ticket, expected_assignees: &[Uuid]) -> Result<bool, DatabaseError> {
        let mut tickets = self.tickets.write().await;
        let Some(stored) = tickets.iter_mut().find(|t| t.id == ticket.id) else {
            return Ok(false);
        };
        if stored.assigned_users != expected_assignees {
            return Ok(false);
        }

        stored.status = ticket.status;
        stored.assigned_users = ticket.assigned_users.clone();
        Ok(true)
    }
}
