//! # Grafana Dashboards
//!
//! Dashboard search, fetch, import, and deletion.
//!
//! The search endpoint returns both dashboards (`dash-db`) and folders
//! (`dash-folder`); callers that delete by search hit must skip the
//! folder-shaped hits. Full dashboard bodies are untyped JSON trees: the
//! panel schema varies widely between plugin versions, so the body is kept
//! as `serde_json::Value` and transformed generically.

use serde::{Deserialize, Serialize};

use crate::{Result, client::GrafanaClient};

/// Maximum number of search results requested.
pub const SEARCH_LIMIT: u32 = 5000;

/// One row of `GET /api/search` output.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchHit {
    #[serde(default)]
    pub id: i64,
    pub uid: String,
    pub title: String,

    /// `dash-db` for dashboards, `dash-folder` for folders.
    #[serde(rename = "type", default)]
    pub hit_type: String,

    #[serde(rename = "folderUid", skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,
}

impl SearchHit {
    /// Returns true if the hit is a folder-shaped pseudo-dashboard.
    pub fn is_folder(&self) -> bool {
        self.hit_type == "dash-folder"
    }
}

/// A full dashboard as returned by `GET /api/dashboards/uid/{uid}`:
/// the body plus the metadata envelope.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DashboardEntry {
    /// The dashboard body (panels, templating, etc). Contains `uid`,
    /// `title`, and the instance-local `id`.
    pub dashboard: serde_json::Value,
    pub meta: DashboardMeta,
}

impl DashboardEntry {
    pub fn uid(&self) -> Option<&str> {
        self.dashboard.get("uid").and_then(|v| v.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.dashboard.get("title").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DashboardMeta {
    /// Uid of the containing folder; absent for the General folder.
    #[serde(rename = "folderUid", skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Request body for `POST /api/dashboards/db`.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardImportRequest {
    /// Dashboard body. The instance-local `id` field must be null so the
    /// target assigns a fresh one.
    pub dashboard: serde_json::Value,

    /// Uid of the target folder, as it exists on the target instance.
    #[serde(rename = "folderUid", skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,

    pub overwrite: bool,
}

impl GrafanaClient {
    /// Lists dashboards (and folder pseudo-dashboards), optionally filtered by tag.
    pub async fn search_dashboards(&self, tag: Option<&str>) -> Result<Vec<SearchHit>> {
        let mut query = vec![("limit".to_string(), SEARCH_LIMIT.to_string())];
        if let Some(tag) = tag {
            query.push(("tag".to_string(), tag.to_string()));
        }
        self.client.get_request("/api/search", &query).await
    }

    /// Fetches a full dashboard (body + meta) by uid.
    pub async fn dashboard_by_uid(&self, uid: &str) -> Result<DashboardEntry> {
        self.client
            .get_request(&format!("/api/dashboards/uid/{uid}"), &[])
            .await
    }

    /// Creates (or with `overwrite`, replaces) a dashboard.
    pub async fn create_dashboard(
        &self,
        request: &DashboardImportRequest,
    ) -> Result<serde_json::Value> {
        self.client.post_request("/api/dashboards/db", request).await
    }

    /// Deletes a dashboard by uid.
    pub async fn delete_dashboard(&self, uid: &str) -> Result<()> {
        self.client
            .delete_request(&format!("/api/dashboards/uid/{uid}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_hit_folder_detection() {
        let hit: SearchHit = serde_json::from_value(json!({
            "id": 3, "uid": "f1", "title": "Infra", "type": "dash-folder"
        }))
        .unwrap();
        assert!(hit.is_folder());

        let hit: SearchHit = serde_json::from_value(json!({
            "id": 4, "uid": "d1", "title": "CPU", "type": "dash-db", "folderUid": "f1"
        }))
        .unwrap();
        assert!(!hit.is_folder());
        assert_eq!(hit.folder_uid.as_deref(), Some("f1"));
    }

    #[test]
    fn test_entry_uid_and_title() {
        let entry: DashboardEntry = serde_json::from_value(json!({
            "dashboard": {"uid": "d1", "title": "CPU", "id": 42, "panels": []},
            "meta": {"folderUid": "f1", "slug": "cpu"}
        }))
        .unwrap();
        assert_eq!(entry.uid(), Some("d1"));
        assert_eq!(entry.title(), Some("CPU"));
        assert_eq!(entry.meta.folder_uid.as_deref(), Some("f1"));
    }
}
