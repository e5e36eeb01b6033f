//! Tool service.

use sea_orm::Set;
use serde::Deserialize;
use toolyard_common::{AppError, AppResult, IdGenerator};
use toolyard_db::{
    entities::{
        activity_log::{self, ActivityAction},
        status_change,
        tool::{self, ToolStatus},
    },
    repositories::{ActivityLogRepository, StatusChangeRepository, ToolListQuery, ToolRepository},
};
use validator::Validate;

/// Tool service for business logic.
#[derive(Clone)]
pub struct ToolService {
    tool_repo: ToolRepository,
    status_repo: StatusChangeRepository,
    activity_repo: ActivityLogRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new tool.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateToolInput {
    #[validate(length(min = 1, max = 64))]
    pub serial_no: String,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(max = 4096))]
    pub description: Option<String>,

    /// Initial condition tag. Defaults to green.
    pub status: Option<ToolStatus>,

    #[validate(length(max = 256))]
    pub location: Option<String>,
}

/// Input for updating a tool's descriptive fields.
///
/// The condition tag is deliberately excluded; it only moves through
/// [`ToolService::change_status`] so every transition leaves a record.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateToolInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(length(max = 4096))]
    pub description: Option<String>,

    #[validate(length(max = 256))]
    pub location: Option<String>,
}

/// Input for changing a tool's condition tag.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeStatusInput {
    pub status: ToolStatus,

    #[validate(length(max = 2048))]
    pub comment: Option<String>,
}

impl ToolService {
    /// Create a new tool service.
    #[must_use]
    pub fn new(
        tool_repo: ToolRepository,
        status_repo: StatusChangeRepository,
        activity_repo: ActivityLogRepository,
    ) -> Self {
        Self {
            tool_repo,
            status_repo,
            activity_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new tool.
    pub async fn create(&self, actor_id: &str, input: CreateToolInput) -> AppResult<tool::Model> {
        input.validate()?;

        if self
            .tool_repo
            .find_by_serial_no(&input.serial_no)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Serial number {} is already registered",
                input.serial_no
            )));
        }

        let status = input.status.unwrap_or(ToolStatus::Green);

        let model = tool::ActiveModel {
            id: Set(self.id_gen.generate()),
            serial_no: Set(input.serial_no),
            name: Set(input.name),
            description: Set(input.description),
            status: Set(status),
            location: Set(input.location),
            ..Default::default()
        };

        let tool = self.tool_repo.create(model).await?;

        self.append_activity(
            actor_id,
            ActivityAction::Create,
            Some(&tool.id),
            format!("Registered tool {} ({})", tool.name, tool.serial_no),
        )
        .await?;

        Ok(tool)
    }

    /// Get a tool by ID.
    pub async fn get(&self, id: &str) -> AppResult<tool::Model> {
        self.tool_repo.get_by_id(id).await
    }

    /// List tools with filters, returning the page and the total count.
    pub async fn list(&self, query: &ToolListQuery) -> AppResult<(Vec<tool::Model>, u64)> {
        let tools = self.tool_repo.list(query).await?;
        let total = self.tool_repo.count(query).await?;
        Ok((tools, total))
    }

    /// Update a tool's descriptive fields.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateToolInput,
    ) -> AppResult<tool::Model> {
        input.validate()?;

        let tool = self.tool_repo.get_by_id(id).await?;
        let mut active: tool::ActiveModel = tool.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let tool = self.tool_repo.update(active).await?;

        self.append_activity(
            actor_id,
            ActivityAction::Update,
            Some(&tool.id),
            format!("Updated tool {} ({})", tool.name, tool.serial_no),
        )
        .await?;

        Ok(tool)
    }

    /// Remove a tool from the inventory.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        let tool = self.tool_repo.get_by_id(id).await?;
        self.tool_repo.delete(id).await?;

        self.append_activity(
            actor_id,
            ActivityAction::Delete,
            None,
            format!("Removed tool {} ({})", tool.name, tool.serial_no),
        )
        .await?;

        Ok(())
    }

    /// Move a tool to a new condition tag, recording the transition.
    pub async fn change_status(
        &self,
        actor_id: &str,
        id: &str,
        input: ChangeStatusInput,
    ) -> AppResult<(tool::Model, status_change::Model)> {
        input.validate()?;

        let tool = self.tool_repo.get_by_id(id).await?;

        if tool.status == input.status {
            return Err(AppError::BadRequest(format!(
                "Tool is already tagged {}",
                input.status.as_str()
            )));
        }

        let from_status = tool.status;
        let updated = self.tool_repo.update_status(id, input.status).await?;

        let change = self
            .status_repo
            .create(status_change::ActiveModel {
                id: Set(self.id_gen.generate()),
                tool_id: Set(updated.id.clone()),
                changed_by: Set(actor_id.to_string()),
                from_status: Set(from_status),
                to_status: Set(input.status),
                comment: Set(input.comment.clone()),
                ..Default::default()
            })
            .await?;

        let details = match &input.comment {
            Some(comment) => format!(
                "Tagged {} {} -> {}: {comment}",
                updated.serial_no,
                from_status.as_str(),
                input.status.as_str()
            ),
            None => format!(
                "Tagged {} {} -> {}",
                updated.serial_no,
                from_status.as_str(),
                input.status.as_str()
            ),
        };
        self.append_activity(actor_id, ActivityAction::Update, Some(&updated.id), details)
            .await?;

        Ok((updated, change))
    }

    /// Status history for a tool, newest first.
    pub async fn history(&self, tool_id: &str) -> AppResult<Vec<status_change::Model>> {
        // 404 for unknown tools rather than an empty history
        self.tool_repo.get_by_id(tool_id).await?;
        self.status_repo.list_for_tool(tool_id).await
    }

    async fn append_activity(
        &self,
        actor_id: &str,
        action: ActivityAction,
        tool_id: Option<&str>,
        details: String,
    ) -> AppResult<()> {
        self.activity_repo
            .append(activity_log::ActiveModel {
                id: Set(self.id_gen.generate()),
                actor_id: Set(Some(actor_id.to_string())),
                action: Set(action),
                tool_id: Set(tool_id.map(ToString::to_string)),
                details: Set(details),
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}
