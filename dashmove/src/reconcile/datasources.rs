//! Datasource reconciliation
//!
//! Matching order: uid, then name with a plugin-type check. A name match
//! with a differing type is a conflict and is skipped under merge policy;
//! under override the live datasource is deleted by its current uid and
//! recreated from the backup, which restores the backup uid on the target.
//! Datasource secrets are not part of the API payloads, so recreated
//! datasources need manual credential entry afterwards.

use grafana_api::prelude::*;
use tracing::{info, warn};

use crate::{
    reconcile::{KindReport, Policy},
    resolve::{DatasourceMatch, match_datasource},
};

/// Planned action for one backup datasource.
#[derive(Debug, PartialEq)]
pub enum DatasourceAction<'a> {
    /// Live counterpart already present (uid, or name with equal type).
    Skip,
    /// Name collision with a differing plugin type. Reported, never merged.
    Conflict { live_uid: String, live_type: String },
    /// Delete the live datasource by its current uid, then create from backup.
    Replace { live_uid: String, backup: &'a Datasource },
    Create(&'a Datasource),
}

/// Decides an action per backup datasource. Pure.
pub fn plan<'a>(
    backup: &'a [Datasource],
    live: &[Datasource],
    policy: Policy,
) -> Vec<DatasourceAction<'a>> {
    backup
        .iter()
        .map(|candidate| match match_datasource(candidate, live) {
            DatasourceMatch::Uid(_) => DatasourceAction::Skip,
            DatasourceMatch::Name(found) => match policy {
                Policy::Merge => DatasourceAction::Skip,
                // recreate so the backup uid lands on the target
                Policy::Override => DatasourceAction::Replace {
                    live_uid: found.uid.clone(),
                    backup: candidate,
                },
            },
            DatasourceMatch::TypeConflict(found) => match policy {
                Policy::Merge => DatasourceAction::Conflict {
                    live_uid: found.uid.clone(),
                    live_type: found.ds_type.clone(),
                },
                Policy::Override => DatasourceAction::Replace {
                    live_uid: found.uid.clone(),
                    backup: candidate,
                },
            },
            DatasourceMatch::None => DatasourceAction::Create(candidate),
        })
        .collect()
}

/// Applies a datasource plan. Write failures are counted and the batch
/// continues.
pub async fn apply(
    client: &GrafanaClient,
    backup: &[Datasource],
    plan: &[DatasourceAction<'_>],
    report: &mut KindReport,
) {
    for (candidate, action) in backup.iter().zip(plan) {
        match action {
            DatasourceAction::Skip => report.skipped += 1,
            DatasourceAction::Conflict { live_uid, live_type } => {
                warn!(
                    "datasource conflict: \"{}\" exists with type {live_type} (uid {live_uid}), backup has type {}; skipping",
                    candidate.name, candidate.ds_type
                );
                report.conflicts += 1;
            }
            DatasourceAction::Replace { live_uid, backup } => {
                // live dashboards referencing the old uid will dangle until
                // they are themselves rewritten
                warn!(
                    "override: replacing datasource \"{}\" (live uid {live_uid}) with backup uid {}",
                    backup.name, backup.uid
                );
                if let Err(err) = client.delete_datasource(live_uid).await {
                    warn!("delete datasource {live_uid}: {err}");
                    report.errored += 1;
                    continue;
                }
                match client.create_datasource(backup).await {
                    Ok(_) => {
                        report.created += 1;
                        report.deleted += 1;
                    }
                    Err(err) => {
                        warn!("create datasource {}: {err}", backup.uid);
                        report.errored += 1;
                    }
                }
            }
            DatasourceAction::Create(backup) => match client.create_datasource(backup).await {
                Ok(_) => {
                    info!("imported datasource {}", backup.name);
                    report.created += 1;
                }
                Err(err) => {
                    warn!("create datasource {}: {err}", backup.uid);
                    report.errored += 1;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn datasource(uid: &str, name: &str, ds_type: &str) -> Datasource {
        serde_json::from_value(json!({"uid": uid, "name": name, "type": ds_type})).unwrap()
    }

    #[test]
    fn test_uid_match_skips() {
        let live = vec![datasource("a", "prod", "postgres")];
        let backup = vec![datasource("a", "renamed", "mysql")];
        assert_eq!(plan(&backup, &live, Policy::Merge), [DatasourceAction::Skip]);
        assert_eq!(plan(&backup, &live, Policy::Override), [DatasourceAction::Skip]);
    }

    #[test]
    fn test_type_conflict_never_silently_overwrites() {
        let live = vec![datasource("a", "prod", "postgres")];
        let backup = vec![datasource("x", "prod", "mysql")];
        assert_eq!(
            plan(&backup, &live, Policy::Merge),
            [DatasourceAction::Conflict {
                live_uid: "a".into(),
                live_type: "postgres".into()
            }]
        );
    }

    #[test]
    fn test_override_replaces_name_match() {
        let live = vec![datasource("a", "prod", "postgres")];
        let backup = vec![datasource("x", "prod", "postgres")];
        assert_eq!(
            plan(&backup, &live, Policy::Override),
            [DatasourceAction::Replace {
                live_uid: "a".into(),
                backup: &backup[0]
            }]
        );
    }

    #[test]
    fn test_new_datasource_created() {
        let backup = vec![datasource("x", "staging", "mysql")];
        assert_eq!(
            plan(&backup, &[], Policy::Merge),
            [DatasourceAction::Create(&backup[0])]
        );
    }

    #[test]
    fn test_second_run_is_all_skips() {
        let backup = vec![
            datasource("a", "prod", "postgres"),
            datasource("b", "staging", "mysql"),
        ];
        let first = plan(&backup, &[], Policy::Merge);
        assert!(first.iter().all(|a| matches!(a, DatasourceAction::Create(_))));

        // live now contains what the first run created
        let live = backup.clone();
        let second = plan(&backup, &live, Policy::Merge);
        assert!(second.iter().all(|a| matches!(a, DatasourceAction::Skip)));
    }
}
