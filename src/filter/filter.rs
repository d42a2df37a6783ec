use tracing::warn;

use super::error::FilterError;
use super::types::{FilterCondition, FilterField, FilterValue};
use crate::database::models::{parse_id, Ticket};
use crate::validation::parse_date_str;

/// Exact-match filter over tickets, built from raw query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketFilter {
    conditions: Vec<FilterCondition>,
}

impl TicketFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from query-string pairs. Keys outside the ticket schema are
    /// dropped; repeated keys accept any of their values.
    pub fn from_query(pairs: &[(String, String)]) -> Result<Self, FilterError> {
        let mut filter = Self::new();
        for (key, raw) in pairs {
            let Some(field) = FilterField::from_key(key) else {
                warn!("Ignoring unknown ticket filter key '{}'", key);
                continue;
            };
            let value = Self::parse_value(field, key, raw)?;
            filter.push(field, value);
        }
        Ok(filter)
    }

    pub fn with(mut self, field: FilterField, value: FilterValue) -> Self {
        self.push(field, value);
        self
    }

    fn push(&mut self, field: FilterField, value: FilterValue) {
        match self.conditions.iter_mut().find(|c| c.field == field) {
            Some(condition) => condition.values.push(value),
            None => self.conditions.push(FilterCondition { field, values: vec![value] }),
        }
    }

    fn parse_value(field: FilterField, key: &str, raw: &str) -> Result<FilterValue, FilterError> {
        let invalid = || FilterError::InvalidValue {
            field: key.to_string(),
            value: raw.to_string(),
        };

        match field {
            FilterField::Id | FilterField::CreatedBy | FilterField::AssignedUsers => {
                parse_id(raw).map(FilterValue::Id).ok_or_else(invalid)
            }
            FilterField::DueDate => parse_date_str(raw).map(FilterValue::Timestamp).ok_or_else(invalid),
            _ => Ok(FilterValue::Text(raw.to_string())),
        }
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the filter in process, for stores without a query engine
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.values.iter().any(|value| Self::field_matches(ticket, condition.field, value)))
    }

    fn field_matches(ticket: &Ticket, field: FilterField, value: &FilterValue) -> bool {
        match (field, value) {
            (FilterField::Id, FilterValue::Id(id)) => ticket.id == *id,
            (FilterField::CreatedBy, FilterValue::Id(id)) => ticket.created_by == *id,
            (FilterField::AssignedUsers, FilterValue::Id(id)) => ticket.assigned_users.contains(id),
            (FilterField::DueDate, FilterValue::Timestamp(ts)) => ticket.due_date == *ts,
            (FilterField::Title, FilterValue::Text(s)) => ticket.title == *s,
            (FilterField::Description, FilterValue::Text(s)) => ticket.description == *s,
            (FilterField::Venue, FilterValue::Text(s)) => ticket.venue == *s,
            (FilterField::Type, FilterValue::Text(s)) => ticket.ticket_type.as_str() == s,
            (FilterField::Status, FilterValue::Text(s)) => ticket.status.as_str() == s,
            (FilterField::Priority, FilterValue::Text(s)) => ticket.priority.as_str() == s,
            _ => false,
        }
    }
}
