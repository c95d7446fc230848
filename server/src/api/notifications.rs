//! The reminder notification inbox.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use super::auth::AuthUser;
use crate::error::AppResult;
use crate::model::{Notification, NotificationStatus, NotificationSummary};
use crate::state::AppState;

/// Unread notifications, newest first.
pub async fn list(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Json<Vec<Notification>> {
    Json(state.db.read().await.unread_notifications(user_id))
}

pub async fn summary(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Json<NotificationSummary> {
    Json(state.db.read().await.notification_summary(user_id))
}

/// Dismissed notifications stay dismissed.
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
) -> AppResult<Json<Notification>> {
    let mut tables = state.db.write().await;
    let notification = tables.owned_notification_mut(user_id, id)?;
    if notification.status == NotificationStatus::Unread {
        notification.status = NotificationStatus::Read;
    }
    Ok(Json(notification.clone()))
}

pub async fn dismiss(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
) -> AppResult<Json<Notification>> {
    let now = state.clock.now();
    let mut tables = state.db.write().await;
    let notification = tables.owned_notification_mut(user_id, id)?;
    if notification.status != NotificationStatus::Dismissed {
        notification.status = NotificationStatus::Dismissed;
        notification.dismissed_at = Some(now);
        info!(notification_id = id, user_id, "dismissed notification");
    }
    Ok(Json(notification.clone()))
}
