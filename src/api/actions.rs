use axum::{body::Bytes, extract::State, http::StatusCode, Json};

use crate::{
    error::{AppError, Result},
    models::{ActionRequest, ActionResponse, GameAction},
    services::mutation,
};

use super::AppState;

/// POST /api
///
/// Every request that parses is queued for the audit log before dispatch, whether or
/// not the action turns out to be valid.
pub async fn handle_action(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ActionResponse>> {
    let request = ActionRequest::parse(&body)?;
    state.audit.record(request.log_entry());

    let action = GameAction::from_request(&request.action, &request.payload)?;
    let user_id = request.user_id()?;
    tracing::debug!("Dispatching {} for user {}", request.action, user_id);

    let account = state.accounts.fetch_or_create(user_id).await?;
    let outcome = mutation::apply(&account, &action)?;
    state.accounts.commit(user_id, &outcome).await?;

    Ok(Json(outcome.response))
}

/// OPTIONS /api without preflight headers; the CORS layer answers real preflights.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
