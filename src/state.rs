use std::sync::Arc;

use anyhow::Context;

use crate::auth::Credentials;
use crate::config::AppConfig;
use crate::database::{
    DatabaseError, DatabaseManager, MemoryTicketStore, MemoryUserStore, PgTicketStore, PgUserStore, TicketStore,
    UserStore,
};
use crate::services::{TicketService, UserService};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub credentials: Arc<Credentials>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, tickets: Arc<dyn TicketStore>, credentials: Credentials) -> Self {
        Self {
            users,
            tickets,
            credentials: Arc::new(credentials),
        }
    }

    /// Process-local stores; data is lost on shutdown.
    pub fn in_memory(credentials: Credentials) -> Self {
        Self::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryTicketStore::new()),
            credentials,
        )
    }

    /// Connects to postgres and creates the schema if needed.
    pub async fn postgres(config: &AppConfig, credentials: Credentials) -> anyhow::Result<Self> {
        config.require_database_url()?;
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        DatabaseManager::migrate(&pool).await.context("failed to prepare schema")?;

        Ok(Self::new(
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgTicketStore::new(pool)),
            credentials,
        ))
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.users.clone(), self.credentials.clone())
    }

    pub fn ticket_service(&self) -> TicketService {
        TicketService::new(self.users.clone(), self.tickets.clone())
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.tickets.ping().await
    }
}
