//! Dashboard reconciliation
//!
//! A backup dashboard is skipped when the target already has its uid.
//! Otherwise it is created with the instance-local id cleared (forcing the
//! target to assign a fresh one) and the containing folder's uid attached.
//! If that folder does not exist on the target - its creation failed, or
//! it was never in the backup - the dashboard is skipped and reported
//! rather than silently misrouted to the General folder.

use std::collections::HashSet;

use grafana_api::prelude::*;
use serde_json::Value;
use tracing::{info, warn};

use crate::reconcile::KindReport;

/// Planned action for one backup dashboard.
#[derive(Debug, PartialEq)]
pub enum DashboardAction<'a> {
    /// A live dashboard with the same uid already exists.
    Skip,
    /// The target folder is missing on the target instance.
    MissingFolder { folder_uid: String },
    Create(&'a DashboardEntry),
}

/// Decides an action per backup dashboard. Pure.
///
/// `live_uids` are the dashboard uids currently on the target;
/// `live_folder_uids` the folder uids present after folder reconciliation.
pub fn plan<'a>(
    backup: &'a [DashboardEntry],
    live_uids: &HashSet<String>,
    live_folder_uids: &HashSet<String>,
) -> Vec<DashboardAction<'a>> {
    backup
        .iter()
        .map(|entry| {
            if entry.uid().is_some_and(|uid| live_uids.contains(uid)) {
                return DashboardAction::Skip;
            }
            if let Some(folder_uid) = entry.meta.folder_uid.as_deref()
                && !folder_uid.is_empty()
                && !live_folder_uids.contains(folder_uid)
            {
                return DashboardAction::MissingFolder {
                    folder_uid: folder_uid.to_string(),
                };
            }
            DashboardAction::Create(entry)
        })
        .collect()
}

/// Builds the creation request: body with the local id cleared, target
/// folder uid attached.
pub fn creation_request(entry: &DashboardEntry) -> DashboardImportRequest {
    let mut dashboard = entry.dashboard.clone();
    if let Some(map) = dashboard.as_object_mut() {
        // a null id triggers assignment of a new one
        map.insert("id".to_string(), Value::Null);
    }
    DashboardImportRequest {
        dashboard,
        folder_uid: entry.meta.folder_uid.clone().filter(|uid| !uid.is_empty()),
        overwrite: false,
    }
}

/// Applies a dashboard plan. Write failures are counted and the batch
/// continues.
pub async fn apply(
    client: &GrafanaClient,
    plan: &[DashboardAction<'_>],
    report: &mut KindReport,
) {
    for action in plan {
        match action {
            DashboardAction::Skip => report.skipped += 1,
            DashboardAction::MissingFolder { folder_uid } => {
                warn!("dashboard skipped: folder {folder_uid} does not exist on the target");
                report.errored += 1;
            }
            DashboardAction::Create(entry) => {
                let request = creation_request(entry);
                match client.create_dashboard(&request).await {
                    Ok(_) => {
                        info!(
                            "imported dashboard {}",
                            entry.title().unwrap_or("(untitled)")
                        );
                        report.created += 1;
                    }
                    Err(err) => {
                        warn!(
                            "create dashboard {}: {err}",
                            entry.uid().unwrap_or("(no uid)")
                        );
                        report.errored += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(uid: &str, folder_uid: Option<&str>) -> DashboardEntry {
        serde_json::from_value(json!({
            "dashboard": {"uid": uid, "title": uid, "id": 42},
            "meta": {"folderUid": folder_uid}
        }))
        .unwrap()
    }

    fn uids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|uid| uid.to_string()).collect()
    }

    #[test]
    fn test_uid_match_skips() {
        let backup = vec![entry("d1", Some("f1"))];
        let plan = plan(&backup, &uids(&["d1"]), &uids(&["f1"]));
        assert_eq!(plan, [DashboardAction::Skip]);
    }

    #[test]
    fn test_missing_folder_skips_not_misroutes() {
        let backup = vec![entry("d1", Some("gone"))];
        let plan = plan(&backup, &HashSet::new(), &uids(&["f1"]));
        assert_eq!(
            plan,
            [DashboardAction::MissingFolder {
                folder_uid: "gone".into()
            }]
        );
    }

    #[test]
    fn test_general_folder_dashboard_creates() {
        // no folder uid means the General folder, which always exists
        let backup = vec![entry("d1", None)];
        let plan = plan(&backup, &HashSet::new(), &HashSet::new());
        assert_eq!(plan, [DashboardAction::Create(&backup[0])]);
    }

    #[test]
    fn test_creation_request_clears_local_id() {
        let request = creation_request(&entry("d1", Some("f1")));
        assert_eq!(request.dashboard["id"], serde_json::Value::Null);
        assert_eq!(request.dashboard["uid"], "d1");
        assert_eq!(request.folder_uid.as_deref(), Some("f1"));
        assert!(!request.overwrite);
    }

    #[test]
    fn test_second_run_is_all_skips() {
        let backup = vec![entry("d1", Some("f1")), entry("d2", None)];
        let folders = uids(&["f1"]);
        let first = plan(&backup, &HashSet::new(), &folders);
        assert!(
            first
                .iter()
                .all(|action| matches!(action, DashboardAction::Create(_)))
        );

        let second = plan(&backup, &uids(&["d1", "d2"]), &folders);
        assert!(second.iter().all(|action| matches!(action, DashboardAction::Skip)));
    }
}
