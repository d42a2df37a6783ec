use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::ticket::AssignmentRefusal;
use crate::database::models::{parse_id, NewTicket, Ticket, UserSummary};
use crate::database::{DatabaseError, TicketStore, UserStore};
use crate::error::ApiError;
use crate::filter::{FilterError, TicketFilter};
use crate::types::{Priority, TicketStatus, TicketType};
use crate::validation::schemas::CREATE_TICKET;
use crate::validation::{parse_date, str_field, ValidationError};

/// Attempts at the conditional assignee update before giving up.
pub const MAX_SAVE_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum TicketError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("created by not a valid user id")]
    UnknownCreator,

    #[error("Invalid ticket id")]
    InvalidTicketId,

    #[error("Invalid user id")]
    InvalidUserId,

    #[error("Ticket not found")]
    NotFound,

    #[error("Cannot assign users to a closed ticket")]
    Closed,

    #[error("User already assigned")]
    AlreadyAssigned,

    #[error("User assignment limit reached")]
    LimitReached,

    #[error("created by not a valid user id")]
    UnknownAssignee,

    #[error("Ticket was modified concurrently, please retry")]
    Contended,

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AssignmentRefusal> for TicketError {
    fn from(refusal: AssignmentRefusal) -> Self {
        match refusal {
            AssignmentRefusal::Closed => TicketError::Closed,
            AssignmentRefusal::AlreadyAssigned => TicketError::AlreadyAssigned,
            AssignmentRefusal::LimitReached => TicketError::LimitReached,
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        let message = err.to_string();
        match err {
            TicketError::Validation(e) => e.into(),
            TicketError::Filter(e) => e.into(),
            TicketError::Database(e) => e.into(),
            TicketError::NotFound => ApiError::not_found(message),
            TicketError::Contended => ApiError::conflict(message),
            _ => ApiError::bad_request(message),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResult {
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStatistics {
    pub total_assigned: usize,
    pub status: TicketStatus,
}

/// Ticket with its assignees resolved to public user records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetails {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub venue: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    pub created_by: Uuid,
    pub assigned_users: Vec<UserSummary>,
    pub statistics: TicketStatistics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAnalytics {
    pub total_tickets: usize,
    pub closed_tickets: usize,
    pub open_tickets: usize,
    pub in_progress_tickets: usize,
    pub tickets: Vec<Ticket>,
}

impl TicketAnalytics {
    pub fn summarize(tickets: Vec<Ticket>) -> Self {
        let count = |status: TicketStatus| tickets.iter().filter(|t| t.status == status).count();
        Self {
            total_tickets: tickets.len(),
            closed_tickets: count(TicketStatus::Closed),
            open_tickets: count(TicketStatus::Open),
            in_progress_tickets: count(TicketStatus::InProgress),
            tickets,
        }
    }
}

pub struct TicketService {
    users: Arc<dyn UserStore>,
    tickets: Arc<dyn TicketStore>,
}

impl TicketService {
    pub fn new(users: Arc<dyn UserStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { users, tickets }
    }

    /// Validates and stores a new ticket with no assignees. `createdBy` must name an
    /// existing user; it is not compared with the acting user.
    pub async fn create_ticket(&self, payload: &Value, actor: Uuid) -> Result<Ticket, TicketError> {
        CREATE_TICKET.validate(payload)?;
        let new_ticket = Self::new_ticket(payload)?;

        if self.users.find_by_id(new_ticket.created_by).await?.is_none() {
            return Err(TicketError::UnknownCreator);
        }

        let ticket = self.tickets.create(new_ticket).await?;
        info!(ticket_id = %ticket.id, actor = %actor, "Created ticket");
        Ok(ticket)
    }

    fn new_ticket(payload: &Value) -> Result<NewTicket, TicketError> {
        let text = |key| str_field(payload, key);
        let invalid = |e: crate::types::UnknownVariant| ValidationError(e.to_string());

        let due_date = payload
            .get("dueDate")
            .and_then(parse_date)
            .ok_or_else(|| ValidationError("Due date must be a valid date".to_string()))?;
        let created_by = parse_id(text("createdBy")).ok_or(TicketError::UnknownCreator)?;

        Ok(NewTicket {
            title: text("title").to_string(),
            description: text("description").to_string(),
            ticket_type: text("type").parse().map_err(invalid)?,
            venue: text("venue").to_string(),
            status: text("status").parse().map_err(invalid)?,
            priority: text("priority").parse().map_err(invalid)?,
            due_date,
            created_by,
        })
    }

    pub async fn assign_user(&self, ticket_id: &str, payload: &Value, actor: Uuid) -> Result<AssignmentResult, TicketError> {
        let ticket_id = parse_id(ticket_id).ok_or(TicketError::InvalidTicketId)?;
        let user_id = payload
            .get("userId")
            .and_then(Value::as_str)
            .and_then(parse_id)
            .ok_or(TicketError::InvalidUserId)?;

        let mut ticket = self.load(ticket_id).await?;
        ticket.ensure_assignable(user_id)?;

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(TicketError::UnknownAssignee);
        }

        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let expected = ticket.assigned_users.clone();
            ticket.assigned_users.push(user_id);

            if self.tickets.save(&ticket, &expected).await? {
                info!(ticket_id = %ticket_id, user_id = %user_id, actor = %actor, "Assigned user to ticket");
                return Ok(AssignmentResult {
                    message: "User assigned successfully",
                });
            }

            warn!(ticket_id = %ticket_id, attempt, "Ticket changed during assignment, re-checking");
            ticket = self.load(ticket_id).await?;
            ticket.ensure_assignable(user_id)?;
        }

        Err(TicketError::Contended)
    }

    pub async fn get_ticket_details(&self, ticket_id: &str) -> Result<TicketDetails, TicketError> {
        let ticket_id = parse_id(ticket_id).ok_or(TicketError::InvalidTicketId)?;
        let ticket = self.load(ticket_id).await?;

        let assigned_users: Vec<UserSummary> = self
            .users
            .find_by_ids(&ticket.assigned_users)
            .await?
            .into_iter()
            .map(UserSummary::from)
            .collect();

        Ok(TicketDetails {
            statistics: TicketStatistics {
                total_assigned: ticket.assigned_users.len(),
                status: ticket.status,
            },
            id: ticket.id,
            title: ticket.title,
            description: ticket.description,
            ticket_type: ticket.ticket_type,
            venue: ticket.venue,
            status: ticket.status,
            priority: ticket.priority,
            due_date: ticket.due_date,
            created_by: ticket.created_by,
            assigned_users,
        })
    }

    /// Every query parameter is an exact-match condition; no per-user scoping.
    pub async fn get_analytics(&self, query: &[(String, String)]) -> Result<TicketAnalytics, TicketError> {
        let filter = TicketFilter::from_query(query)?;
        let tickets = self.tickets.find_by_filter(&filter).await?;
        Ok(TicketAnalytics::summarize(tickets))
    }

    async fn load(&self, ticket_id: Uuid) -> Result<Ticket, TicketError> {
        self.tickets.find_by_id(ticket_id).await?.ok_or(TicketError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::MAX_ASSIGNED_USERS;
    use crate::testing::TestContext;
    use axum::http::StatusCode;
    use serde_json::json;

    fn message(err: TicketError) -> (StatusCode, String) {
        let api = ApiError::from(err);
        (api.status_code(), api.message().to_string())
    }

    #[tokio::test]
    async fn creates_open_ticket_without_assignees() {
        let ctx = TestContext::new();
        let creator = ctx.create_user("creator@example.com").await;

        let ticket = ctx
            .tickets()
            .create_ticket(&ctx.ticket_payload(creator.id, "open"), creator.id)
            .await
            .unwrap();

        assert_eq!(ticket.created_by, creator.id);
        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.assigned_users.is_empty());
    }

    #[tokio::test]
    async fn creator_must_exist_and_be_well_formed() {
        let ctx = TestContext::new();
        let actor = ctx.create_user("actor@example.com").await;

        let unknown = ctx.ticket_payload(Uuid::new_v4(), "open");
        let err = ctx.tickets().create_ticket(&unknown, actor.id).await.unwrap_err();
        assert_eq!(message(err), (StatusCode::BAD_REQUEST, "created by not a valid user id".to_string()));

        let mut malformed = ctx.ticket_payload(actor.id, "open");
        malformed["createdBy"] = json!("not-an-id");
        let err = ctx.tickets().create_ticket(&malformed, actor.id).await.unwrap_err();
        assert_eq!(message(err), (StatusCode::BAD_REQUEST, "created by not a valid user id".to_string()));
    }

    #[tokio::test]
    async fn creator_need_not_be_the_caller() {
        let ctx = TestContext::new();
        let actor = ctx.create_user("actor@example.com").await;
        let other = ctx.create_user("other@example.com").await;

        let ticket = ctx
            .tickets()
            .create_ticket(&ctx.ticket_payload(other.id, "open"), actor.id)
            .await
            .unwrap();
        assert_eq!(ticket.created_by, other.id);
    }

    #[tokio::test]
    async fn assignment_checks_run_in_order() {
        let ctx = TestContext::new();
        let user = ctx.create_user("user@example.com").await;
        let ticket = ctx.create_ticket(user.id, "open").await;
        let id = ticket.id.to_string();
        let body = json!({ "userId": user.id });

        let err = ctx.tickets().assign_user("abc", &json!({ "userId": "xyz" }), user.id).await.unwrap_err();
        assert_eq!(message(err).1, "Invalid ticket id");

        let err = ctx.tickets().assign_user(&id, &json!({ "userId": "xyz" }), user.id).await.unwrap_err();
        assert_eq!(message(err).1, "Invalid user id");

        let err = ctx.tickets().assign_user(&id, &json!({}), user.id).await.unwrap_err();
        assert_eq!(message(err).1, "Invalid user id");

        let missing = Uuid::new_v4().to_string();
        let err = ctx.tickets().assign_user(&missing, &body, user.id).await.unwrap_err();
        assert_eq!(message(err), (StatusCode::NOT_FOUND, "Ticket not found".to_string()));

        let stranger = json!({ "userId": Uuid::new_v4() });
        let err = ctx.tickets().assign_user(&id, &stranger, user.id).await.unwrap_err();
        assert_eq!(message(err).1, "created by not a valid user id");

        let ok = ctx.tickets().assign_user(&id, &body, user.id).await.unwrap();
        assert_eq!(ok.message, "User assigned successfully");

        let err = ctx.tickets().assign_user(&id, &body, user.id).await.unwrap_err();
        assert_eq!(message(err).1, "User already assigned");
    }

    #[tokio::test]
    async fn closed_ticket_refuses_even_unknown_users() {
        let ctx = TestContext::new();
        let user = ctx.create_user("user@example.com").await;
        let ticket = ctx.create_ticket(user.id, "closed").await;

        let stranger = json!({ "userId": Uuid::new_v4() });
        let err = ctx
            .tickets()
            .assign_user(&ticket.id.to_string(), &stranger, user.id)
            .await
            .unwrap_err();
        assert_eq!(message(err).1, "Cannot assign users to a closed ticket");
    }

    #[tokio::test]
    async fn limit_is_enforced_after_five_assignees() {
        let ctx = TestContext::new();
        let creator = ctx.create_user("creator@example.com").await;
        let ticket = ctx.create_ticket(creator.id, "in-progress").await;
        let id = ticket.id.to_string();

        for n in 0..MAX_ASSIGNED_USERS {
            let user = ctx.create_user(&format!("user{n}@example.com")).await;
            ctx.tickets()
                .assign_user(&id, &json!({ "userId": user.id }), creator.id)
                .await
                .unwrap();
        }

        let late = ctx.create_user("late@example.com").await;
        let err = ctx
            .tickets()
            .assign_user(&id, &json!({ "userId": late.id }), creator.id)
            .await
            .unwrap_err();
        assert_eq!(message(err).1, "User assignment limit reached");

        let stored = ctx.state.tickets.find_by_id(ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.assigned_users.len(), MAX_ASSIGNED_USERS);
    }

    #[tokio::test]
    async fn concurrent_assignments_never_exceed_the_limit() {
        let ctx = TestContext::new();
        let creator = ctx.create_user("creator@example.com").await;
        let ticket = ctx.create_ticket(creator.id, "open").await;
        let id = ticket.id.to_string();

        let mut users = Vec::new();
        for n in 0..8 {
            users.push(ctx.create_user(&format!("racer{n}@example.com")).await);
        }

        let mut handles = Vec::new();
        for user in users {
            let service = ctx.state.ticket_service();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                service.assign_user(&id, &json!({ "userId": user.id }), user.id).await
            }));
        }

        let mut assigned = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                assigned += 1;
            }
        }

        let stored = ctx.state.tickets.find_by_id(ticket.id).await.unwrap().unwrap();
        assert!(assigned <= MAX_ASSIGNED_USERS);
        assert_eq!(stored.assigned_users.len(), assigned);
    }

    #[tokio::test]
    async fn details_project_assignees_in_order() {
        let ctx = TestContext::new();
        let creator = ctx.create_user("creator@example.com").await;
        let ticket = ctx.create_ticket(creator.id, "open").await;
        let id = ticket.id.to_string();

        let mut expected = Vec::new();
        for n in 0..3 {
            let user = ctx.create_user(&format!("user{n}@example.com")).await;
            ctx.tickets()
                .assign_user(&id, &json!({ "userId": user.id }), creator.id)
                .await
                .unwrap();
            expected.push(UserSummary::from(user));
        }

        let details = ctx.tickets().get_ticket_details(&id).await.unwrap();
        assert_eq!(details.assigned_users, expected);
        assert_eq!(details.statistics.total_assigned, 3);
        assert_eq!(details.statistics.status, TicketStatus::Open);

        let body = serde_json::to_value(&details).unwrap();
        assert_eq!(body["statistics"]["totalAssigned"], 3);
        assert!(body["assignedUsers"][0].get("password").is_none());
    }

    #[tokio::test]
    async fn details_reject_bad_and_unknown_ids() {
        let ctx = TestContext::new();
        let err = ctx.tickets().get_ticket_details("abc").await.unwrap_err();
        assert_eq!(message(err), (StatusCode::BAD_REQUEST, "Invalid ticket id".to_string()));

        let err = ctx.tickets().get_ticket_details(&Uuid::new_v4().to_string()).await.unwrap_err();
        assert_eq!(message(err), (StatusCode::NOT_FOUND, "Ticket not found".to_string()));
    }

    #[tokio::test]
    async fn analytics_count_by_status() {
        let ctx = TestContext::new();
        let creator = ctx.create_user("creator@example.com").await;
        for status in ["open", "open", "closed", "in-progress", "in-progress"] {
            ctx.create_ticket(creator.id, status).await;
        }

        let all = ctx.tickets().get_analytics(&[]).await.unwrap();
        assert_eq!(all.total_tickets, 5);
        assert_eq!(all.open_tickets, 2);
        assert_eq!(all.closed_tickets, 1);
        assert_eq!(all.in_progress_tickets, 2);

        let query = vec![("status".to_string(), "open".to_string())];
        let open = ctx.tickets().get_analytics(&query).await.unwrap();
        assert_eq!(open.total_tickets, 2);
        assert_eq!(open.open_tickets, 2);
        assert_eq!(open.closed_tickets, 0);
        assert_eq!(open.in_progress_tickets, 0);
    }

    #[tokio::test]
    async fn analytics_rejects_malformed_typed_values() {
        let ctx = TestContext::new();
        let query = vec![("createdBy".to_string(), "nope".to_string())];
        let err = ctx.tickets().get_analytics(&query).await.unwrap_err();
        assert_eq!(message(err), (StatusCode::BAD_REQUEST, "Invalid value for filter 'createdBy'".to_string()));
    }
}
