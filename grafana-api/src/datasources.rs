//! # Grafana Datasources
//!
//! Datasource listing, lookup, creation, and deletion.
//!
//! Credentials (`secureJsonData`) are write-only in the Grafana API: they
//! are never returned on read, so a migrated datasource arrives on the
//! target without secrets and needs manual credential entry. Known
//! limitation, not a bug.

use serde::{Deserialize, Serialize};

use crate::{Result, client::GrafanaClient};

/// A Grafana datasource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Datasource {
    /// Instance-local numeric id. Not portable; cleared before create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Stable identifier, portable between instances.
    pub uid: String,

    pub name: String,

    /// Plugin type, e.g. "postgres" or "prometheus". Together with `name`
    /// this forms the secondary match key when the uid is new to a target.
    #[serde(rename = "type")]
    pub ds_type: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Datasource {
    /// Returns a copy suitable for `POST /api/datasources`: the
    /// instance-local id cleared so the target assigns its own.
    pub fn creation_body(&self) -> Datasource {
        Datasource {
            id: None,
            ..self.clone()
        }
    }
}

impl GrafanaClient {
    /// Lists all datasources (summary records).
    pub async fn list_datasources(&self) -> Result<Vec<Datasource>> {
        self.client.get_request("/api/datasources", &[]).await
    }

    /// Fetches one datasource by uid.
    pub async fn datasource_by_uid(&self, uid: &str) -> Result<Datasource> {
        self.client
            .get_request(&format!("/api/datasources/uid/{uid}"), &[])
            .await
    }

    /// Creates a datasource. Secrets are not part of the body; the created
    /// datasource will typically require manual credential entry.
    pub async fn create_datasource(&self, datasource: &Datasource) -> Result<serde_json::Value> {
        self.client
            .post_request("/api/datasources", &datasource.creation_body())
            .await
    }

    /// Deletes a datasource by uid.
    pub async fn delete_datasource(&self, uid: &str) -> Result<()> {
        self.client
            .delete_request(&format!("/api/datasources/uid/{uid}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_creation_body_clears_local_id() {
        let ds: Datasource = serde_json::from_value(json!({
            "id": 12, "uid": "pg1", "name": "prod", "type": "postgres",
            "url": "db.local:5432", "isDefault": true
        }))
        .unwrap();
        let body = serde_json::to_value(ds.creation_body()).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["uid"], "pg1");
        // unmodeled fields ride along
        assert_eq!(body["isDefault"], json!(true));
    }
}
