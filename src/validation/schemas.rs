//! Request schemas. Message text is part of the public API.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Field, Rule, Schema};

pub const TICKET_TYPES: &[&str] = &["concert", "conference", "sports"];
pub const TICKET_STATUSES: &[&str] = &["open", "in-progress", "closed"];
pub const PRIORITIES: &[&str] = &["low", "medium", "high"];

const PASSWORD_STRENGTH: &str =
    "Password must contain at least one uppercase letter, one lowercase letter, one number, and one special character";

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("static pattern compiles")
}

fn email() -> Field {
    Field::text("email")
        .required("Email is required")
        .base("Email should be a type of text")
        .rule(Rule::Email, "Invalid email format")
}

pub static REGISTRATION: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .field(
            Field::text("name")
                .required("Name is required")
                .base("Name should be a type of text")
                .rule(Rule::MinLength(3), "Name should have at least 3 characters")
                .rule(Rule::MaxLength(30), "Name should have at most 30 characters"),
        )
        .field(email())
        .field(
            Field::text("password")
                .required("Password is required")
                .base("Password should be a type of text")
                .rule(Rule::MinLength(8), "Password should have at least 8 characters")
                .rule(Rule::MaxLength(20), "Password should have at most 20 characters")
                .rule(Rule::Pattern(pattern("[A-Z]")), PASSWORD_STRENGTH)
                .rule(Rule::Pattern(pattern("[a-z]")), PASSWORD_STRENGTH)
                .rule(Rule::Pattern(pattern("[0-9]")), PASSWORD_STRENGTH)
                .rule(Rule::Pattern(pattern("[^A-Za-z0-9]")), PASSWORD_STRENGTH),
        )
});

pub static LOGIN: Lazy<Schema> = Lazy::new(|| {
    Schema::new().field(email()).field(
        Field::text("password")
            .required("Password is required")
            .base("Password should be a type of text"),
    )
});

pub static CREATE_TICKET: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .field(
            Field::text("title")
                .required("Title is required")
                .base("Title should be a type of text")
                .rule(Rule::MinLength(3), "Title should have at least 3 characters")
                .rule(Rule::MaxLength(100), "Title should have at most 100 characters"),
        )
        .field(
            Field::text("description")
                .required("Description is required")
                .base("Description should be a type of text")
                .rule(Rule::MinLength(5), "Description should have at least 5 characters")
                .rule(Rule::MaxLength(500), "Description should have at most 500 characters"),
        )
        .field(
            Field::text("type")
                .required("Type is required")
                .base("Type should be a type of text")
                .rule(Rule::OneOf(TICKET_TYPES), "Type must be one of: concert, conference, sports"),
        )
        .field(
            Field::text("venue")
                .required("Venue is required")
                .base("Venue should be a type of text")
                .rule(Rule::MinLength(3), "Venue should have at least 3 characters")
                .rule(Rule::MaxLength(100), "Venue should have at most 100 characters"),
        )
        .field(
            Field::text("status")
                .required("Status is required")
                .base("Status should be a type of text")
                .rule(Rule::OneOf(TICKET_STATUSES), "Status must be one of: open, in-progress, closed"),
        )
        .field(
            Field::text("priority")
                .required("Priority is required")
                .base("Priority should be a type of text")
                .rule(Rule::OneOf(PRIORITIES), "Priority must be one of: low, medium, high"),
        )
        .field(
            Field::date("dueDate")
                .required("Due date is required")
                .base("Due date must be a valid date")
                .rule(Rule::Future, "Due date must be in the future"),
        )
        .field(
            Field::text("createdBy")
                .required("Created By is required")
                .base("Created By should be a type of text"),
        )
});
