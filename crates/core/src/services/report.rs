//! Inventory reports.

use sea_orm::Set;
use toolyard_common::{AppResult, IdGenerator};
use toolyard_db::{
    entities::{
        activity_log::{self, ActivityAction},
        status_change,
        tool::{self, ToolStatus},
    },
    repositories::{ActivityLogRepository, StatusChangeRepository, ToolRepository},
};

/// How many recent transitions the summary carries.
const SUMMARY_RECENT_CHANGES: u64 = 10;

/// Condition tag counts plus recent activity.
#[derive(Debug)]
pub struct InventorySummary {
    pub total: u64,
    pub red: u64,
    pub yellow: u64,
    pub green: u64,
    pub white: u64,
    pub recent_changes: Vec<status_change::Model>,
}

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    tool_repo: ToolRepository,
    status_repo: StatusChangeRepository,
    activity_repo: ActivityLogRepository,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
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

    /// Current condition counts across the inventory.
    pub async fn summary(&self) -> AppResult<InventorySummary> {
        let red = self.tool_repo.count_by_status(ToolStatus::Red).await?;
        let yellow = self.tool_repo.count_by_status(ToolStatus::Yellow).await?;
        let green = self.tool_repo.count_by_status(ToolStatus::Green).await?;
        let white = self.tool_repo.count_by_status(ToolStatus::White).await?;

        let recent_changes = self.status_repo.list_recent(SUMMARY_RECENT_CHANGES).await?;

        Ok(InventorySummary {
            total: red + yellow + green + white,
            red,
            yellow,
            green,
            white,
            recent_changes,
        })
    }

    /// Export the full inventory as CSV, logging the export.
    pub async fn export_csv(&self, actor_id: &str) -> AppResult<String> {
        let tools = self.tool_repo.list_all().await?;
        let csv = Self::render_csv(&tools);

        self.activity_repo
            .append(activity_log::ActiveModel {
                id: Set(self.id_gen.generate()),
                actor_id: Set(Some(actor_id.to_string())),
                action: Set(ActivityAction::Report),
                tool_id: Set(None),
                details: Set(format!("Exported inventory CSV ({} tools)", tools.len())),
                ..Default::default()
            })
            .await?;

        Ok(csv)
    }

    /// Render tools as a CSV document.
    ///
    /// CSV format: serial_no,name,status,location,description,created_at
    #[must_use]
    pub fn render_csv(tools: &[tool::Model]) -> String {
        let mut csv = String::from("serial_no,name,status,location,description,created_at\n");

        for tool in tools {
            // Escape CSV fields (double quotes and newlines)
            let escape_csv = |s: &str| {
                if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
                    format!("\"{}\"", s.replace('"', "\"\""))
                } else {
                    s.to_string()
                }
            };

            let location = tool.location.as_deref().unwrap_or("");
            let description = tool.description.as_deref().unwrap_or("");

            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                escape_csv(&tool.serial_no),
                escape_csv(&tool.name),
                tool.status.as_str(),
                escape_csv(location),
                escape_csv(description),
                tool.created_at.to_rfc3339(),
            ));
        }

        csv
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn create_test_tool(serial_no: &str, name: &str, status: ToolStatus) -> tool::Model {
        tool::Model {
            id: "tool1".to_string(),
            serial_no: serial_no.to_string(),
            name: name.to_string(),
            description: None,
            status,
            location: Some("Yard A".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
    }

    #[test]
    fn test_render_csv_plain_fields() {
        let tools = vec![create_test_tool("DC-4500-017", "Drill Collar", ToolStatus::Green)];
        let csv = ReportService::render_csv(&tools);

        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "serial_no,name,status,location,description,created_at"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("DC-4500-017,Drill Collar,green,Yard A,,"));
    }

    #[test]
    fn test_render_csv_escapes_commas_and_quotes() {
        let mut tool = create_test_tool("DC-1", "Collar, 4-1/2\"", ToolStatus::Red);
        tool.description = Some("line one\nline two".to_string());

        let csv = ReportService::render_csv(&[tool]);

        assert!(csv.contains("\"Collar, 4-1/2\"\"\""));
        assert!(csv.contains("\"line one\nline two\""));
    }

    #[tokio::test]
    async fn test_summary_totals_tag_counts() {
        let tool_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![count_row(2)],
                    vec![count_row(1)],
                    vec![count_row(5)],
                    vec![count_row(0)],
                ])
                .into_connection(),
        );
        let status_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<status_change::Model>::new()])
                .into_connection(),
        );
        let activity_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = ReportService::new(
            ToolRepository::new(tool_db),
            StatusChangeRepository::new(status_db),
            ActivityLogRepository::new(activity_db),
        );

        let summary = service.summary().await.unwrap();
        assert_eq!(summary.red, 2);
        assert_eq!(summary.yellow, 1);
        assert_eq!(summary.green, 5);
        assert_eq!(summary.white, 0);
        assert_eq!(summary.total, 8);
        assert!(summary.recent_changes.is_empty());
    }
}
