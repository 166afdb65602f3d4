//! Folder reconciliation
//!
//! Under override policy a pre-pass deletes every live folder whose uid is
//! absent from the backup set; the server cascades the delete to the
//! dashboards and alert rules the folder contains. The General folder
//! (id 0) always exists and is excluded from both creation and deletion.
//!
//! Creation sends the restricted field set with the uid included, so the
//! created folder keeps cross-instance portability. Merge-by-title is
//! deliberately not a strategy here: uid equality is the only merge key.

use std::collections::HashSet;

use grafana_api::prelude::*;
use tracing::{info, warn};

use crate::reconcile::{KindReport, Policy};

/// Planned action for one backup folder.
#[derive(Debug, PartialEq)]
pub enum FolderAction<'a> {
    /// The implicit root folder is never created.
    SkipRoot,
    /// A live folder with the same uid already exists.
    Skip,
    Create(&'a Folder),
}

/// Folder plan: override-mode deletions first, then per-item actions.
#[derive(Debug, Default, PartialEq)]
pub struct FolderPlan<'a> {
    /// Live folder uids to delete before creating (override only).
    pub delete_uids: Vec<String>,
    pub actions: Vec<FolderAction<'a>>,
}

/// Decides deletions and per-folder actions. Pure.
pub fn plan<'a>(backup: &'a [Folder], live: &[Folder], policy: Policy) -> FolderPlan<'a> {
    let backup_uids: HashSet<&str> = backup.iter().map(|folder| folder.uid.as_str()).collect();

    let delete_uids = if policy == Policy::Override {
        live.iter()
            .filter(|folder| !folder.is_general() && !backup_uids.contains(folder.uid.as_str()))
            .map(|folder| folder.uid.clone())
            .collect()
    } else {
        Vec::new()
    };

    let live_uids: HashSet<&str> = live.iter().map(|folder| folder.uid.as_str()).collect();
    let actions = backup
        .iter()
        .map(|candidate| {
            if candidate.is_general() {
                FolderAction::SkipRoot
            } else if live_uids.contains(candidate.uid.as_str()) {
                FolderAction::Skip
            } else {
                FolderAction::Create(candidate)
            }
        })
        .collect();

    FolderPlan {
        delete_uids,
        actions,
    }
}

/// Applies a folder plan. Returns the uids whose creation failed, so
/// dependent dashboard imports can be skipped instead of misrouted.
pub async fn apply(
    client: &GrafanaClient,
    plan: &FolderPlan<'_>,
    report: &mut KindReport,
) -> Vec<String> {
    for uid in &plan.delete_uids {
        // cascades to contained dashboards and alert rules
        match client.delete_folder(uid).await {
            Ok(()) => {
                info!("deleted live folder {uid} (not in backup)");
                report.deleted += 1;
            }
            Err(err) => {
                warn!("delete folder {uid}: {err}");
                report.errored += 1;
            }
        }
    }

    let mut failed_uids = Vec::new();
    for action in &plan.actions {
        match action {
            FolderAction::SkipRoot | FolderAction::Skip => report.skipped += 1,
            FolderAction::Create(folder) => {
                match client.create_folder(&NewFolder::from(*folder)).await {
                    Ok(created) => {
                        info!("imported folder {} ({})", created.title, created.uid);
                        report.created += 1;
                    }
                    Err(err) => {
                        warn!("create folder {}: {err}", folder.uid);
                        report.errored += 1;
                        failed_uids.push(folder.uid.clone());
                    }
                }
            }
        }
    }
    failed_uids
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn folder(id: i64, uid: &str, title: &str) -> Folder {
        serde_json::from_value(json!({"id": id, "uid": uid, "title": title})).unwrap()
    }

    #[test]
    fn test_root_folder_never_created_or_deleted() {
        let backup = vec![folder(0, "general", "General"), folder(5, "infra", "Infra")];
        let live = vec![folder(0, "general", "General")];

        for policy in [Policy::Merge, Policy::Override] {
            let plan = plan(&backup, &live, policy);
            assert!(!plan.delete_uids.contains(&"general".to_string()));
            assert_eq!(plan.actions[0], FolderAction::SkipRoot);
            assert_eq!(plan.actions[1], FolderAction::Create(&backup[1]));
        }
    }

    #[test]
    fn test_merge_keeps_foreign_live_folders() {
        let backup = vec![folder(5, "infra", "Infra")];
        let live = vec![folder(9, "local-only", "Local")];
        let plan = plan(&backup, &live, Policy::Merge);
        assert!(plan.delete_uids.is_empty());
    }

    #[test]
    fn test_override_deletes_foreign_live_folders() {
        let backup = vec![folder(5, "infra", "Infra")];
        let live = vec![
            folder(9, "local-only", "Local"),
            folder(10, "infra", "Infra"),
        ];
        let plan = plan(&backup, &live, Policy::Override);
        assert_eq!(plan.delete_uids, ["local-only"]);
        // uid match survives override
        assert_eq!(plan.actions, [FolderAction::Skip]);
    }

    #[test]
    fn test_second_run_is_all_skips() {
        let backup = vec![folder(5, "infra", "Infra"), folder(6, "apps", "Apps")];
        let first = plan(&backup, &[], Policy::Merge);
        assert!(
            first
                .actions
                .iter()
                .all(|action| matches!(action, FolderAction::Create(_)))
        );

        let live = backup.clone();
        let second = plan(&backup, &live, Policy::Merge);
        assert!(
            second
                .actions
                .iter()
                .all(|action| matches!(action, FolderAction::Skip))
        );
    }
}
