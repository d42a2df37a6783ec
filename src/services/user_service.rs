use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{AuthError, Credentials};
use crate::database::models::{NewUser, UserSummary};
use crate::database::{DatabaseError, UserStore};
use crate::error::ApiError;
use crate::validation::schemas::{LOGIN, REGISTRATION};
use crate::validation::{str_field, ValidationError};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("User already exists")]
    AlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(e) => e.into(),
            UserError::AlreadyExists => ApiError::conflict("User already exists"),
            UserError::InvalidCredentials => ApiError::unauthorized("Invalid email or password"),
            UserError::Auth(e) => e.into(),
            UserError::Database(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub struct UserService {
    users: Arc<dyn UserStore>,
    credentials: Arc<Credentials>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, credentials: Arc<Credentials>) -> Self {
        Self { users, credentials }
    }

    pub async fn register(&self, payload: &Value) -> Result<UserSummary, UserError> {
        REGISTRATION.validate(payload)?;
        let name = str_field(payload, "name");
        let email = str_field(payload, "email");
        let password = str_field(payload, "password");

        if self.users.find_by_email(email).await?.is_some() {
            return Err(UserError::AlreadyExists);
        }

        let password_hash = self.credentials.hash_password(password)?;
        let user = self
            .users
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost the race against a concurrent registration
                DatabaseError::Duplicate(_) => UserError::AlreadyExists,
                other => UserError::Database(other),
            })?;

        info!(user_id = %user.id, "Registered user");
        Ok(user.into())
    }

    pub async fn login(&self, payload: &Value) -> Result<LoginResponse, UserError> {
        LOGIN.validate(payload)?;
        let email = str_field(payload, "email");
        let password = str_field(payload, "password");

        let user = match self.users.find_by_email(email).await? {
            Some(user) if self.credentials.verify_password(password, &user.password) => user,
            _ => {
                warn!("Rejected login attempt");
                return Err(UserError::InvalidCredentials);
            }
        };

        let token = self.credentials.issue_token(user.id)?;
        Ok(LoginResponse { token })
    }
}
