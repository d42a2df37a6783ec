use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Ticket fields that may appear in an analytics filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Id,
    Title,
    Description,
    Type,
    Venue,
    Status,
    Priority,
    DueDate,
    CreatedBy,
    AssignedUsers,
}

impl FilterField {
    /// Resolves a query-string key. Returns `None` for keys outside the ticket schema.
    pub fn from_key(key: &str) -> Option<Self> {
        let field = match key {
            "id" | "_id" => FilterField::Id,
            "title" => FilterField::Title,
            "description" => FilterField::Description,
            "type" => FilterField::Type,
            "venue" => FilterField::Venue,
            "status" => FilterField::Status,
            "priority" => FilterField::Priority,
            "dueDate" => FilterField::DueDate,
            "createdBy" => FilterField::CreatedBy,
            "assignedUsers" => FilterField::AssignedUsers,
            _ => return None,
        };
        Some(field)
    }

    pub fn column(&self) -> &'static str {
        match self {
            FilterField::Id => "id",
            FilterField::Title => "title",
            FilterField::Description => "description",
            FilterField::Type => "ticket_type",
            FilterField::Venue => "venue",
            FilterField::Status => "status",
            FilterField::Priority => "priority",
            FilterField::DueDate => "due_date",
            FilterField::CreatedBy => "created_by",
            FilterField::AssignedUsers => "assigned_users",
        }
    }

    /// Array columns match when they contain the value
    pub fn is_array(&self) -> bool {
        matches!(self, FilterField::AssignedUsers)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Id(Uuid),
    Timestamp(DateTime<Utc>),
}

/// One field compared against one or more accepted values (OR)
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub field: FilterField,
    pub values: Vec<FilterValue>,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterValue>,
}
