//! # Grafana Folders
//!
//! Folder listing, lookup, creation, and deletion.
//!
//! A folder has two identifiers: the instance-local numeric `id`
//! (reassigned on creation, not portable) and the stable `uid` (portable
//! across instances). Id `0` is the implicit "General" folder, which always
//! exists and can be neither created nor deleted.
//!
//! Deleting a folder cascades server-side to the dashboards and alert
//! rules it contains.

use serde::{Deserialize, Serialize};

use crate::{Result, client::GrafanaClient};

/// The local id of the implicit root ("General") folder.
pub const GENERAL_FOLDER_ID: i64 = 0;

/// A Grafana folder.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Folder {
    /// Instance-local numeric id. Not portable between instances.
    #[serde(default)]
    pub id: i64,

    /// Stable identifier, portable between instances.
    pub uid: String,

    pub title: String,

    /// Uid of the parent folder, for nested folders.
    #[serde(rename = "parentUid", skip_serializing_if = "Option::is_none")]
    pub parent_uid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Instance-local bookkeeping fields (urls, timestamps, permissions)
    /// preserved for snapshot fidelity but never sent on create.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Folder {
    /// Returns true for the implicit root folder.
    pub fn is_general(&self) -> bool {
        self.id == GENERAL_FOLDER_ID
    }
}

/// The restricted field set sent when creating a folder.
/// The uid is sent explicitly so the created folder keeps cross-instance
/// portability.
#[derive(Debug, Clone, Serialize)]
pub struct NewFolder {
    pub uid: String,
    pub title: String,
    #[serde(rename = "parentUid", skip_serializing_if = "Option::is_none")]
    pub parent_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Folder> for NewFolder {
    fn from(folder: &Folder) -> Self {
        NewFolder {
            uid: folder.uid.clone(),
            title: folder.title.clone(),
            parent_uid: folder.parent_uid.clone(),
            description: folder.description.clone(),
        }
    }
}

impl GrafanaClient {
    /// Lists all folders. The implicit General folder (id 0) is not included.
    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        self.client.get_request("/api/folders", &[]).await
    }

    /// Fetches a folder by its instance-local id. Id 0 returns the General folder.
    pub async fn folder_by_id(&self, id: i64) -> Result<Folder> {
        self.client
            .get_request(&format!("/api/folders/id/{id}"), &[])
            .await
    }

    /// Creates a folder from the restricted field set.
    pub async fn create_folder(&self, folder: &NewFolder) -> Result<Folder> {
        self.client.post_request("/api/folders", folder).await
    }

    /// Deletes a folder by uid. Contained dashboards and alert rules are
    /// removed by the server as part of the delete.
    pub async fn delete_folder(&self, uid: &str) -> Result<()> {
        self.client
            .delete_request(&format!("/api/folders/{uid}"))
            .await
    }
}
