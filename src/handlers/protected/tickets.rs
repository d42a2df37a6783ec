// handlers/protected/tickets.rs - /api/tickets/*

use axum::extract::{Path, Query, State};
use axum::Extension;
use tracing::debug;

use crate::database::models::Ticket;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::services::ticket_service::AssignmentResult;
use crate::services::{TicketAnalytics, TicketDetails};
use crate::state::AppState;

/// POST /api/tickets - create a ticket
pub async fn ticket_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(payload): JsonBody,
) -> ApiResult<Ticket> {
    let ticket = state.ticket_service().create_ticket(&payload, user.id).await?;
    Ok(ApiResponse::created(ticket))
}

/// POST /api/tickets/:ticketId/assign - add `userId` to the ticket's assignees
pub async fn assign_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ticket_id): Path<String>,
    JsonBody(payload): JsonBody,
) -> ApiResult<AssignmentResult> {
    let result = state.ticket_service().assign_user(&ticket_id, &payload, user.id).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/tickets/:ticketId - ticket with resolved assignees and statistics
pub async fn ticket_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ticket_id): Path<String>,
) -> ApiResult<TicketDetails> {
    debug!(actor = %user.id, ticket_id = %ticket_id, "Fetching ticket details");
    let details = state.ticket_service().get_ticket_details(&ticket_id).await?;
    Ok(ApiResponse::success(details))
}

/// GET /api/tickets/analytics - status counts over tickets matching the query string
pub async fn analytics_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<Vec<(String, String)>>,
) -> ApiResult<TicketAnalytics> {
    debug!(actor = %user.id, filters = query.len(), "Computing ticket analytics");
    let analytics = state.ticket_service().get_analytics(&query).await?;
    Ok(ApiResponse::success(analytics))
}
