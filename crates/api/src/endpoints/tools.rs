//! Tool inventory endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use toolyard_common::{AppError, AppResult};
use toolyard_core::{ChangeStatusInput, CreateToolInput, UpdateToolInput};
use toolyard_db::{
    entities::{
        status_change,
        tool::{self, ToolStatus},
        user::UserRole,
    },
    repositories::ToolListQuery,
};
use validator::Validate;

use super::auth::MessageResponse;
use crate::{extractors::AuthUser, middleware::AppState};

/// Tool as returned to clients.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub id: String,
    pub serial_no: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ToolStatus,
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<tool::Model> for ToolResponse {
    fn from(tool: tool::Model) -> Self {
        Self {
            id: tool.id,
            serial_no: tool.serial_no,
            name: tool.name,
            description: tool.description,
            status: tool.status,
            location: tool.location,
            created_at: tool.created_at.to_rfc3339(),
            updated_at: tool.updated_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Recorded status transition as returned to clients.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResponse {
    pub id: String,
    pub tool_id: String,
    pub changed_by: String,
    pub from_status: ToolStatus,
    pub to_status: ToolStatus,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<status_change::Model> for StatusChangeResponse {
    fn from(change: status_change::Model) -> Self {
        Self {
            id: change.id,
            tool_id: change.tool_id,
            changed_by: change.changed_by,
            from_status: change.from_status,
            to_status: change.to_status,
            comment: change.comment,
            created_at: change.created_at.to_rfc3339(),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsQuery {
    pub status: Option<ToolStatus>,
    pub search: Option<String>,

    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_per_page() -> u64 {
    20
}

/// Paginated tool listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolListResponse {
    pub tools: Vec<ToolResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// List tools, filtered by tag and free-text search.
async fn list_tools(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ToolsQuery>,
) -> AppResult<Json<ToolListResponse>> {
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 100);

    let (tools, total) = state
        .tool_service
        .list(&ToolListQuery {
            status: query.status,
            search: query.search,
            limit: per_page,
            offset: (page - 1) * per_page,
        })
        .await?;

    Ok(Json(ToolListResponse {
        tools: tools.into_iter().map(Into::into).collect(),
        total,
        page,
        per_page,
    }))
}

/// Create tool request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateToolRequest {
    #[validate(length(min = 1, max = 64))]
    pub serial_no: String,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    pub description: Option<String>,

    /// Initial condition tag. Defaults to green.
    pub status: Option<ToolStatus>,

    pub location: Option<String>,
}

/// Register a new tool.
async fn create_tool(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateToolRequest>,
) -> AppResult<Json<ToolResponse>> {
    req.validate()?;

    let tool = state
        .tool_service
        .create(
            &user.id,
            CreateToolInput {
                serial_no: req.serial_no,
                name: req.name,
                description: req.description,
                status: req.status,
                location: req.location,
            },
        )
        .await?;

    Ok(Json(tool.into()))
}

/// Fetch a single tool.
async fn get_tool(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ToolResponse>> {
    let tool = state.tool_service.get(&id).await?;
    Ok(Json(tool.into()))
}

/// Update tool request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateToolRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub location: Option<String>,
}

/// Update a tool's descriptive fields.
async fn update_tool(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateToolRequest>,
) -> AppResult<Json<ToolResponse>> {
    req.validate()?;

    let tool = state
        .tool_service
        .update(
            &user.id,
            &id,
            UpdateToolInput {
                name: req.name,
                description: req.description,
                location: req.location,
            },
        )
        .await?;

    Ok(Json(tool.into()))
}

/// Remove a tool from the inventory (admin only).
async fn delete_tool(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    if user.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only administrators can remove tools".to_string(),
        ));
    }

    state.tool_service.delete(&user.id, &id).await?;

    Ok(Json(MessageResponse {
        message: "Tool removed".to_string(),
    }))
}

/// Status change request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub status: ToolStatus,

    #[validate(length(max = 2048))]
    pub comment: Option<String>,
}

/// Status change response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusResponse {
    pub tool: ToolResponse,
    pub change: StatusChangeResponse,
}

/// Move a tool to a new condition tag.
async fn change_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChangeStatusRequest>,
) -> AppResult<Json<ChangeStatusResponse>> {
    req.validate()?;

    let (tool, change) = state
        .tool_service
        .change_status(
            &user.id,
            &id,
            ChangeStatusInput {
                status: req.status,
                comment: req.comment,
            },
        )
        .await?;

    Ok(Json(ChangeStatusResponse {
        tool: tool.into(),
        change: change.into(),
    }))
}

/// Status history for a tool, newest first.
async fn history(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<StatusChangeResponse>>> {
    let changes = state.tool_service.history(&id).await?;
    Ok(Json(changes.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tools).post(create_tool))
        .route("/{id}", get(get_tool).put(update_tool).delete(delete_tool))
        .route("/{id}/status", post(change_status))
        .route("/{id}/history", get(history))
}
