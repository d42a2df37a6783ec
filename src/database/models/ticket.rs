use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::types::{Priority, TicketStatus, TicketType};

/// Upper bound on `assigned_users`.
pub const MAX_ASSIGNED_USERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
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
    pub assigned_users: Vec<Uuid>,
}

/// Validated creation input.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub ticket_type: TicketType,
    pub venue: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    pub created_by: Uuid,
}

impl NewTicket {
    pub fn into_ticket(self, id: Uuid) -> Ticket {
        Ticket {
            id,
            title: self.title,
            description: self.description,
            ticket_type: self.ticket_type,
            venue: self.venue,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            created_by: self.created_by,
            assigned_users: Vec::new(),
        }
    }
}

/// Why a user cannot be added to a ticket's assignees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentRefusal {
    Closed,
    AlreadyAssigned,
    LimitReached,
}

impl Ticket {
    /// Checks, in order: closed status, duplicate assignee, assignee limit.
    pub fn ensure_assignable(&self, user_id: Uuid) -> Result<(), AssignmentRefusal> {
        if self.status == TicketStatus::Closed {
            return Err(AssignmentRefusal::Closed);
        }
        if self.assigned_users.contains(&user_id) {
            return Err(AssignmentRefusal::AlreadyAssigned);
        }
        if self.assigned_users.len() >= MAX_ASSIGNED_USERS {
            return Err(AssignmentRefusal::LimitReached);
        }
        Ok(())
    }
}

/// Raw `tickets` row; enum columns are stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub ticket_type: String,
    pub venue: String,
    pub status: String,
    pub priority: String,
    pub due_date: DateTime<Utc>,
    pub created_by: Uuid,
    pub assigned_users: Vec<Uuid>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = DatabaseError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = move |e: crate::types::UnknownVariant| {
            DatabaseError::Corrupt(format!("ticket {}: {}", id, e))
        };

        Ok(Ticket {
            id: row.id,
            ticket_type: row.ticket_type.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            priority: row.priority.parse().map_err(corrupt)?,
            title: row.title,
            description: row.description,
            venue: row.venue,
            due_date: row.due_date,
            created_by: row.created_by,
            assigned_users: row.assigned_users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ticket(status: TicketStatus, assignees: usize) -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            title: "Summer Fest".to_string(),
            description: "Outdoor concert".to_string(),
            ticket_type: TicketType::Concert,
            venue: "Central Park".to_string(),
            status,
            priority: Priority::High,
            due_date: Utc::now() + Duration::days(7),
            created_by: Uuid::new_v4(),
            assigned_users: (0..assignees).map(|_| Uuid::new_v4()).collect(),
        }
    }

    #[test]
    fn closed_ticket_refuses_before_other_checks() {
        let full = ticket(TicketStatus::Closed, MAX_ASSIGNED_USERS);
        let existing = full.assigned_users[0];
        assert_eq!(full.ensure_assignable(existing), Err(AssignmentRefusal::Closed));
    }

    #[test]
    fn duplicate_is_reported_before_limit() {
        let full = ticket(TicketStatus::Open, MAX_ASSIGNED_USERS);
        let existing = full.assigned_users[2];
        assert_eq!(full.ensure_assignable(existing), Err(AssignmentRefusal::AlreadyAssigned));
        assert_eq!(full.ensure_assignable(Uuid::new_v4()), Err(AssignmentRefusal::LimitReached));
    }

    #[test]
    fn open_ticket_with_room_accepts() {
        let t = ticket(TicketStatus::InProgress, 4);
        assert_eq!(t.ensure_assignable(Uuid::new_v4()), Ok(()));
    }

    #[test]
    fn serializes_with_wire_names() {
        let t = ticket(TicketStatus::InProgress, 0);
        let value = serde_json::to_value(&t).unwrap();
        assert_eq!(value["type"], "concert");
        assert_eq!(value["status"], "in-progress");
        assert!(value["dueDate"].is_string());
        assert_eq!(value["assignedUsers"], serde_json::json!([]));
        assert_eq!(value["createdBy"], t.created_by.to_string());
    }

    #[test]
    fn rejects_rows_with_unknown_enum_text() {
        let t = ticket(TicketStatus::Open, 0);
        let row = TicketRow {
            id: t.id,
            title: t.title.clone(),
            description: t.description.clone(),
            ticket_type: "concert".to_string(),
            venue: t.venue.clone(),
            status: "archived".to_string(),
            priority: "high".to_string(),
            due_date: t.due_date,
            created_by: t.created_by,
            assigned_users: vec![],
        };
        assert!(matches!(Ticket::try_from(row), Err(DatabaseError::Corrupt(_))));
    }
}
