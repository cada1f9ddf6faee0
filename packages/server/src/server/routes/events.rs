//! Detected event listing.

use axum::{extract::Extension, Json};

use crate::domains::events::DetectedEvent;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

/// GET /api/events - all events detected in the user's documents, newest first
pub async fn list_events(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<DetectedEvent>>, ApiError> {
    let events = DetectedEvent::list_for_user(user.user_id, &state.db_pool).await?;
    Ok(Json(events))
}
