use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{NewTicket, NewUser, Ticket, TicketRow, User};
use crate::database::query_builder::QueryBuilder;
use crate::database::repository::{TicketStore, UserStore};
use crate::filter::TicketFilter;

const USER_COLUMNS: &str = "id, name, email, password, created_at";
const TICKET_COLUMNS: &str =
    "id, title, description, ticket_type, venue, status, priority, due_date, created_by, assigned_users";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        // Restore the caller's order
        Ok(ids
            .iter()
            .filter_map(|id| users.iter().find(|u| u.id == *id).cloned())
            .collect())
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let email = user.email.clone();
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, format!("email {}", email)))
    }
}

pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn create(&self, ticket: NewTicket) -> Result<Ticket, DatabaseError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "INSERT INTO tickets (id, title, description, ticket_type, venue, status, priority, due_date, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(ticket.title)
        .bind(ticket.description)
        .bind(ticket.ticket_type.as_str())
        .bind(ticket.venue)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.due_date)
        .bind(ticket.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ticket::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, DatabaseError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Ticket::try_from).transpose()
    }

    async fn find_by_filter(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, DatabaseError> {
        let rows: Vec<TicketRow> = QueryBuilder::new("tickets", TICKET_COLUMNS)
            .filter(filter)
            .order_by("created_at, id")
            .select_all(&self.pool)
            .await?;
        rows.into_iter().map(Ticket::try_from).collect()
    }

    async fn save(&self, ticket: &Ticket, expected_assignees: &[Uuid]) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE tickets SET status = $2, assigned_users = $3
             WHERE id = $1 AND assigned_users = $4",
        )
        .bind(ticket.id)
        .bind(ticket.status.as_str())
        .bind(&ticket.assigned_users)
        .bind(expected_assignees)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
