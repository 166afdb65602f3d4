//! Pre-import purge
//!
//! Under the override policy every live dashboard is deleted before the
//! backup is imported, so the target ends up with exactly the backup's
//! dashboard set. Folder-shaped search hits are skipped here; foreign
//! folders (and whatever they contain) are handled by the folder
//! reconciler, which avoids deleting the same object twice.

use grafana_api::prelude::*;
use tracing::{info, warn};

use crate::reconcile::KindReport;

/// Selects the dashboards to purge from a search result. Pure.
pub fn purge_targets(hits: &[SearchHit]) -> Vec<&SearchHit> {
    hits.iter().filter(|hit| !hit.is_folder()).collect()
}

/// Deletes the selected dashboards. Failures are counted in the report
/// and the purge continues.
pub async fn purge_dashboards(client: &GrafanaClient, hits: &[SearchHit], report: &mut KindReport) {
    for hit in purge_targets(hits) {
        match client.delete_dashboard(&hit.uid).await {
            Ok(()) => {
                info!("purged dashboard {}", hit.title);
                report.deleted += 1;
            }
            Err(err) => {
                warn!("delete dashboard {}: {err}", hit.uid);
                report.errored += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(uid: &str, hit_type: &str) -> SearchHit {
        serde_json::from_value(json!({
            "id": 1, "uid": uid, "title": uid, "type": hit_type
        }))
        .unwrap()
    }

    #[test]
    fn test_folders_excluded_from_purge() {
        let hits = vec![
            hit("d1", "dash-db"),
            hit("f1", "dash-folder"),
            hit("d2", "dash-db"),
        ];
        let targets = purge_targets(&hits);
        let uids: Vec<&str> = targets.iter().map(|hit| hit.uid.as_str()).collect();
        assert_eq!(uids, ["d1", "d2"]);
    }

    #[test]
    fn test_empty_search_purges_nothing() {
        assert!(purge_targets(&[]).is_empty());
    }
}
