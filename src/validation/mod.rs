//! Declarative request validation.
//!
//! A [`Schema`] is an ordered table of fields, each carrying its own rules and
//! messages. Fields are checked in declaration order and the first failure is
//! returned as a single human-readable message.

pub mod date;
pub mod schemas;

pub use date::{parse_date, parse_date_str};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// String value of `key`, or "" when absent or not a string. Meant for payloads
/// that already passed a [`Schema`].
pub fn str_field<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or_default()
}

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
}

#[derive(Debug, Clone)]
pub enum Rule {
    MinLength(usize),
    MaxLength(usize),
    Email,
    Pattern(Regex),
    OneOf(&'static [&'static str]),
    /// Strictly later than the validation instant
    Future,
}

#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    kind: FieldKind,
    required_message: &'static str,
    base_message: &'static str,
    rules: Vec<(Rule, &'static str)>,
}

impl Field {
    pub fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required_message: "",
            base_message: "",
            rules: Vec::new(),
        }
    }

    /// Message for an absent field
    pub fn required(mut self, message: &'static str) -> Self {
        self.required_message = message;
        self
    }

    /// Message for a value of the wrong type
    pub fn base(mut self, message: &'static str) -> Self {
        self.base_message = message;
        self
    }

    pub fn rule(mut self, rule: Rule, message: &'static str) -> Self {
        self.rules.push((rule, message));
        self
    }

    fn check(&self, value: Option<&Value>, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let fail = |message: &str| Err(ValidationError(message.to_string()));

        let Some(value) = value else {
            return fail(self.required_message);
        };

        match self.kind {
            FieldKind::Text => {
                let Some(text) = value.as_str() else {
                    return fail(self.base_message);
                };
                if text.is_empty() {
                    return Err(ValidationError(format!("\"{}\" is not allowed to be empty", self.name)));
                }
                for (rule, message) in &self.rules {
                    if !Self::text_passes(rule, text) {
                        return fail(message);
                    }
                }
            }
            FieldKind::Date => {
                let Some(instant) = parse_date(value) else {
                    return fail(self.base_message);
                };
                for (rule, message) in &self.rules {
                    if matches!(rule, Rule::Future) && instant <= now {
                        return fail(message);
                    }
                }
            }
        }
        Ok(())
    }

    fn text_passes(rule: &Rule, text: &str) -> bool {
        match rule {
            Rule::MinLength(min) => text.chars().count() >= *min,
            Rule::MaxLength(max) => text.chars().count() <= *max,
            Rule::Email => EMAIL.is_match(text),
            Rule::Pattern(pattern) => pattern.is_match(text),
            Rule::OneOf(allowed) => allowed.contains(&text),
            Rule::Future => true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn validate(&self, payload: &Value) -> Result<(), ValidationError> {
        self.validate_at(payload, Utc::now())
    }

    /// Validates against a fixed "now", so date rules are reproducible
    pub fn validate_at(&self, payload: &Value, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let empty = Map::new();
        let object = match payload {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ValidationError("\"value\" must be of type object".to_string())),
        };

        for field in &self.fields {
            field.check(object.get(field.name), now)?;
        }

        if let Some(unknown) = object.keys().find(|key| !self.fields.iter().any(|f| f.name == key.as_str())) {
            return Err(ValidationError(format!("\"{}\" is not allowed", unknown)));
        }

        Ok(())
    }
}
