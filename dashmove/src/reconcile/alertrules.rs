//! Alert rule reconciliation
//!
//! Rules are keyed by uid. Under merge an existing rule is left alone;
//! under override it is updated in place with the backup version. Missing
//! rules are created either way. Writes always go through the portable
//! projection so instance-local fields from the source never reach the
//! target.

use std::collections::HashSet;

use grafana_api::prelude::*;
use tracing::{info, warn};

use crate::reconcile::{KindReport, Policy};

/// Planned action for one backup alert rule.
#[derive(Debug, PartialEq)]
pub enum RuleAction<'a> {
    /// A live rule with the same uid exists and the policy is merge.
    Skip,
    /// A live rule with the same uid exists; override replaces it in place.
    Update(&'a AlertRule),
    Create(&'a AlertRule),
}

/// Decides an action per backup rule. Pure.
pub fn plan<'a>(
    backup: &'a [AlertRule],
    live_uids: &HashSet<String>,
    policy: Policy,
) -> Vec<RuleAction<'a>> {
    backup
        .iter()
        .map(|rule| {
            if live_uids.contains(&rule.uid) {
                match policy {
                    Policy::Merge => RuleAction::Skip,
                    Policy::Override => RuleAction::Update(rule),
                }
            } else {
                RuleAction::Create(rule)
            }
        })
        .collect()
}

/// Applies an alert rule plan. Write failures are counted and the batch
/// continues.
pub async fn apply(client: &GrafanaClient, plan: &[RuleAction<'_>], report: &mut KindReport) {
    for action in plan {
        match action {
            RuleAction::Skip => report.skipped += 1,
            RuleAction::Update(rule) => match client.update_alert_rule(rule).await {
                Ok(_) => {
                    info!("updated alert rule {}", rule.title);
                    report.updated += 1;
                }
                Err(err) => {
                    warn!("update alert rule {}: {err}", rule.uid);
                    report.errored += 1;
                }
            },
            RuleAction::Create(rule) => match client.create_alert_rule(rule).await {
                Ok(_) => {
                    info!("imported alert rule {}", rule.title);
                    report.created += 1;
                }
                Err(err) => {
                    warn!("create alert rule {}: {err}", rule.uid);
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

    fn rule(uid: &str) -> AlertRule {
        serde_json::from_value(json!({
            "uid": uid,
            "title": uid,
            "condition": "C",
            "data": [],
            "execErrState": "Error",
            "noDataState": "NoData",
            "folderUID": "f1",
            "orgID": 1,
            "ruleGroup": "g",
            "for": "5m"
        }))
        .unwrap()
    }

    fn uids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|uid| uid.to_string()).collect()
    }

    #[test]
    fn test_merge_skips_existing_creates_missing() {
        let backup = vec![rule("r1"), rule("r2")];
        let plan = plan(&backup, &uids(&["r1"]), Policy::Merge);
        assert_eq!(plan, [RuleAction::Skip, RuleAction::Create(&backup[1])]);
    }

    #[test]
    fn test_override_updates_existing_in_place() {
        let backup = vec![rule("r1"), rule("r2")];
        let plan = plan(&backup, &uids(&["r1"]), Policy::Override);
        assert_eq!(
            plan,
            [RuleAction::Update(&backup[0]), RuleAction::Create(&backup[1])]
        );
    }

    #[test]
    fn test_second_merge_run_is_all_skips() {
        let backup = vec![rule("r1"), rule("r2")];
        let second = plan(&backup, &uids(&["r1", "r2"]), Policy::Merge);
        assert!(second.iter().all(|action| matches!(action, RuleAction::Skip)));
    }
}
