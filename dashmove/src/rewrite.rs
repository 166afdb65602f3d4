//! Dashlist folder-reference rewriting
//!
//! A "dashlist" panel renders a list of dashboards filtered by folder, and
//! embeds that folder reference in its options as either the instance-local
//! `folderId` or the stable `folderUid` - never both. Exported snapshots
//! carry the uid form (portable); bodies sent to an instance carry the id
//! form (what the panel expects at render time).
//!
//! Both passes walk the entire nested dashboard tree, rewriting only
//! dashlist-typed objects and passing everything else through unchanged.
//! They produce new trees rather than mutating in place.

use anyhow::{Result, anyhow};
use serde_json::Value;
use tracing::warn;

use crate::resolve::FolderIndex;

const DASHLIST_TYPE: &str = "dashlist";
const FOLDER_ID_KEY: &str = "folderId";
const FOLDER_UID_KEY: &str = "folderUid";

fn is_dashlist(map: &serde_json::Map<String, Value>) -> bool {
    map.get("type").and_then(Value::as_str) == Some(DASHLIST_TYPE)
}

/// Export pass: rewrite `options.folderId` into `options.folderUid`.
///
/// A `folderId` of 0 refers to the General folder and is left alone. An id
/// the index cannot resolve is logged and left untouched; a reference is
/// never deleted just because it cannot be resolved.
pub fn fold_refs_to_uid(value: Value, folders: &FolderIndex) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| fold_refs_to_uid(item, folders))
                .collect(),
        ),
        Value::Object(map) if is_dashlist(&map) => Value::Object(uid_form(map, folders)),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, fold_refs_to_uid(value, folders)))
                .collect(),
        ),
        scalar => scalar,
    }
}

fn uid_form(
    mut panel: serde_json::Map<String, Value>,
    folders: &FolderIndex,
) -> serde_json::Map<String, Value> {
    let Some(options) = panel.get_mut("options").and_then(Value::as_object_mut) else {
        return panel;
    };
    let Some(folder_id) = options.get(FOLDER_ID_KEY).and_then(Value::as_i64) else {
        return panel;
    };
    if folder_id == 0 {
        return panel;
    }
    match folders.uid_for(folder_id) {
        Some(uid) => {
            options.insert(FOLDER_UID_KEY.to_string(), Value::String(uid.to_string()));
            options.remove(FOLDER_ID_KEY);
        }
        None => {
            warn!("dashlist panel: folder with id {folder_id} not found, keeping the current id");
        }
    }
    panel
}

/// Import pass: rewrite `options.folderUid` into `options.folderId`,
/// resolved against the target's current folder set.
///
/// An unresolvable uid is an error: it means the referenced folder was not
/// reconciled, and importing the dashboard would leave a dangling
/// reference.
pub fn fold_refs_to_id(value: Value, folders: &FolderIndex) -> Result<Value> {
    Ok(match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| fold_refs_to_id(item, folders))
                .collect::<Result<_>>()?,
        ),
        Value::Object(map) if is_dashlist(&map) => Value::Object(id_form(map, folders)?),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| Ok((key, fold_refs_to_id(value, folders)?)))
                .collect::<Result<_>>()?,
        ),
        scalar => scalar,
    })
}

fn id_form(
    mut panel: serde_json::Map<String, Value>,
    folders: &FolderIndex,
) -> Result<serde_json::Map<String, Value>> {
    let Some(options) = panel.get_mut("options").and_then(Value::as_object_mut) else {
        return Ok(panel);
    };
    let Some(folder_uid) = options
        .get(FOLDER_UID_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return Ok(panel);
    };
    let folder_id = folders.local_id(&folder_uid).ok_or_else(|| {
        anyhow!("dashlist panel references folder uid {folder_uid} which does not exist on the target")
    })?;
    options.insert(FOLDER_ID_KEY.to_string(), Value::from(folder_id));
    options.remove(FOLDER_UID_KEY);
    Ok(panel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafana_api::prelude::*;
    use serde_json::json;

    fn index() -> FolderIndex {
        let folders: Vec<Folder> = serde_json::from_value(json!([
            {"id": 0, "uid": "general", "title": "General"},
            {"id": 7, "uid": "infra-uid", "title": "Infra"}
        ]))
        .unwrap();
        FolderIndex::new(&folders)
    }

    fn dashlist(options: Value) -> Value {
        json!({"type": "dashlist", "title": "links", "options": options})
    }

    #[test]
    fn test_id_to_uid_rewrites_nested_panel() {
        let dashboard = json!({
            "dashboard": {
                "panels": [
                    {"type": "row", "panels": [dashlist(json!({"folderId": 7, "maxItems": 10}))]},
                    {"type": "graph", "options": {"folderId": 7}}
                ]
            }
        });
        let result = fold_refs_to_uid(dashboard, &index());
        let inner = &result["dashboard"]["panels"][0]["panels"][0]["options"];
        assert_eq!(inner["folderUid"], "infra-uid");
        assert!(inner.get("folderId").is_none());
        assert_eq!(inner["maxItems"], 10);
        // non-dashlist objects pass through untouched
        assert_eq!(result["dashboard"]["panels"][1]["options"]["folderId"], 7);
    }

    #[test]
    fn test_id_zero_left_alone() {
        let panel = dashlist(json!({"folderId": 0}));
        let result = fold_refs_to_uid(panel, &index());
        assert_eq!(result["options"]["folderId"], 0);
        assert!(result["options"].get("folderUid").is_none());
    }

    #[test]
    fn test_unresolved_id_left_untouched() {
        let panel = dashlist(json!({"folderId": 999}));
        let result = fold_refs_to_uid(panel, &index());
        assert_eq!(result["options"]["folderId"], 999);
        assert!(result["options"].get("folderUid").is_none());
    }

    #[test]
    fn test_uid_to_id_rewrites() {
        let panel = dashlist(json!({"folderUid": "infra-uid"}));
        let result = fold_refs_to_id(panel, &index()).unwrap();
        assert_eq!(result["options"]["folderId"], 7);
        assert!(result["options"].get("folderUid").is_none());
    }

    #[test]
    fn test_dangling_uid_is_error() {
        let panel = dashlist(json!({"folderUid": "gone"}));
        assert!(fold_refs_to_id(panel, &index()).is_err());
    }

    #[test]
    fn test_round_trip_identity() {
        let panel = dashlist(json!({"folderId": 7, "maxItems": 30}));
        let folders = index();
        let there = fold_refs_to_uid(panel.clone(), &folders);
        let back = fold_refs_to_id(there, &folders).unwrap();
        assert_eq!(back, panel);
    }
}
