//! Admin endpoints: account lifecycle and the cleanup scheduler.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use toolyard_common::AppResult;
use toolyard_core::{days_until_deletion, deletion_date};
use toolyard_db::entities::{
    activity_log::{self, ActivityAction},
    user::{self, UserRole},
};
use tracing::info;

use crate::{extractors::AuthUser, middleware::AppState};

/// Account as seen by administrators.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub is_scheduled_for_deletion: bool,
    pub scheduled_deletion_date: Option<String>,
    pub days_to_deletion: Option<i64>,
    pub created_at: String,
}

impl From<user::Model> for AdminUserResponse {
    fn from(user: user::Model) -> Self {
        let now = Utc::now();

        Self {
            is_scheduled_for_deletion: user.deletion_scheduled_at.is_some(),
            scheduled_deletion_date: user
                .deletion_scheduled_at
                .map(|at| deletion_date(at).to_rfc3339()),
            days_to_deletion: user
                .deletion_scheduled_at
                .map(|at| days_until_deletion(at, now)),
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// List all accounts with their deletion-pipeline state (admin only).
async fn list_users(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminUserResponse>>> {
    if user.role != UserRole::Admin {
        return Err(toolyard_common::AppError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }

    let users = state.lifecycle_service.list_users().await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Deletion scheduled response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDeletionResponse {
    pub message: String,
    pub scheduled_deletion_date: String,
}

/// Schedule an account for deletion after the grace period (admin only).
async fn schedule_deletion(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ScheduleDeletionResponse>> {
    if user.role != UserRole::Admin {
        return Err(toolyard_common::AppError::Forbidden(
            "Only administrators can schedule deletions".to_string(),
        ));
    }

    let (target, date) = state
        .lifecycle_service
        .schedule_deletion(&user.id, &id)
        .await?;

    info!(admin_id = %user.id, user_id = %target.id, "Scheduled account deletion");

    Ok(Json(ScheduleDeletionResponse {
        message: format!("Account {} is scheduled for deletion", target.username),
        scheduled_deletion_date: date.to_rfc3339(),
    }))
}

/// Restore response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub message: String,
}

/// Take an account out of the deletion pipeline (admin only).
async fn restore_user(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<RestoreResponse>> {
    if user.role != UserRole::Admin {
        return Err(toolyard_common::AppError::Forbidden(
            "Only administrators can restore accounts".to_string(),
        ));
    }

    let target = state.lifecycle_service.restore(&user.id, &id).await?;

    info!(admin_id = %user.id, user_id = %target.id, "Restored account");

    Ok(Json(RestoreResponse {
        message: format!("Account {} has been restored", target.username),
    }))
}

/// Scheduler state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupServiceResponse {
    pub is_running: bool,
    pub next_run_time: Option<String>,
}

/// Account in the deletion pipeline.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledUserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub scheduled_deletion_date: Option<String>,
    pub days_remaining: Option<i64>,
}

/// Cleanup status response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStatusResponse {
    pub cleanup_service: CleanupServiceResponse,
    pub scheduled_users: Vec<ScheduledUserResponse>,
}

/// Scheduler state plus every account in the pipeline (admin only).
async fn cleanup_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CleanupStatusResponse>> {
    if user.role != UserRole::Admin {
        return Err(toolyard_common::AppError::Forbidden(
            "Only administrators can manage cleanup".to_string(),
        ));
    }

    let status = state.cleanup_service.status().await;
    let scheduled = state.lifecycle_service.scheduled_users().await?;

    let now = Utc::now();
    let scheduled_users = scheduled
        .into_iter()
        .map(|account| ScheduledUserResponse {
            scheduled_deletion_date: account
                .deletion_scheduled_at
                .map(|at| deletion_date(at).to_rfc3339()),
            days_remaining: account
                .deletion_scheduled_at
                .map(|at| days_until_deletion(at, now)),
            id: account.id,
            username: account.username,
            email: account.email,
        })
        .collect();

    Ok(Json(CleanupStatusResponse {
        cleanup_service: CleanupServiceResponse {
            is_running: status.is_running,
            next_run_time: status.next_run_time.map(|at| at.to_rfc3339()),
        },
        scheduled_users,
    }))
}

/// Cleanup run response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRunResponse {
    pub deleted_users: u64,
    pub reminders_sent: u64,
    pub errors: Vec<String>,
}

/// Run one cleanup scan immediately (admin only).
async fn run_cleanup(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CleanupRunResponse>> {
    if user.role != UserRole::Admin {
        return Err(toolyard_common::AppError::Forbidden(
            "Only administrators can manage cleanup".to_string(),
        ));
    }

    let summary = state.cleanup_service.run_manual_cleanup(&user.id).await;

    info!(
        admin_id = %user.id,
        deleted = summary.deleted_users,
        reminders = summary.reminders_sent,
        "Manual cleanup finished"
    );

    Ok(Json(CleanupRunResponse {
        deleted_users: summary.deleted_users,
        reminders_sent: summary.reminders_sent,
        errors: summary.errors,
    }))
}

/// Activity query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    #[serde(default = "default_activity_limit")]
    pub limit: u64,

    #[serde(default)]
    pub offset: u64,
}

const fn default_activity_limit() -> u64 {
    50
}

/// Activity-log entry response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: String,
    pub actor_id: Option<String>,
    pub action: ActivityAction,
    pub tool_id: Option<String>,
    pub details: String,
    pub created_at: String,
}

impl From<activity_log::Model> for ActivityResponse {
    fn from(entry: activity_log::Model) -> Self {
        Self {
            id: entry.id,
            actor_id: entry.actor_id,
            action: entry.action,
            tool_id: entry.tool_id,
            details: entry.details,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Recent activity-log entries, newest first (admin only).
async fn activity(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityResponse>>> {
    if user.role != UserRole::Admin {
        return Err(toolyard_common::AppError::Forbidden(
            "Only administrators can view the activity log".to_string(),
        ));
    }

    let entries = state
        .lifecycle_service
        .recent_activity(query.limit.min(200), query.offset)
        .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", delete(schedule_deletion))
        .route("/users/{id}/restore", put(restore_user))
        .route("/cleanup/status", get(cleanup_status))
        .route("/cleanup/run", post(run_cleanup))
        .route("/activity", get(activity))
}
