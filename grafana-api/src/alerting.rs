//! # Grafana Alert Rules
//!
//! Alert rule listing, fetch, and provisioning.
//!
//! Two endpoint families are involved: the ruler endpoint
//! (`/api/ruler/grafana/api/v1/rules`) is the only way to enumerate rules,
//! and returns a folder -> rule-group -> rules nesting that must be
//! flattened; individual rules are then read and written through the
//! provisioning endpoints (`/api/v1/provisioning/alert-rules`).
//!
//! Only a small field subset of a rule is portable between instances;
//! everything else (instance-assigned ids, timestamps, provenance) must be
//! stripped before a write. See [`AlertRule::portable`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Result, client::GrafanaClient};

/// A Grafana alert rule.
///
/// The named fields are the portable subset; everything else the
/// provisioning API returns is captured in `extra` so snapshots keep full
/// fidelity, and dropped again on write.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AlertRule {
    /// Stable identifier, portable between instances.
    pub uid: String,

    pub title: String,

    /// RefId of the condition query.
    pub condition: String,

    /// Query/expression definitions evaluated by the rule.
    pub data: serde_json::Value,

    #[serde(rename = "execErrState")]
    pub exec_err_state: String,

    #[serde(rename = "noDataState")]
    pub no_data_state: String,

    /// Uid of the containing folder.
    #[serde(rename = "folderUID")]
    pub folder_uid: String,

    #[serde(rename = "orgID")]
    pub org_id: i64,

    #[serde(rename = "ruleGroup")]
    pub rule_group: String,

    /// Pending duration before the rule fires, e.g. "5m".
    #[serde(rename = "for")]
    pub for_duration: serde_json::Value,

    /// Instance-local fields (id, updated timestamp, provenance, ...).
    /// Never included in a write body.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AlertRule {
    /// Projects the rule to the portable field subset. The returned value
    /// serializes to exactly the fields that carry meaning across
    /// instances; all instance-local bookkeeping is dropped.
    pub fn portable(&self) -> AlertRule {
        AlertRule {
            extra: serde_json::Map::new(),
            ..self.clone()
        }
    }
}

// Ruler endpoint response: folder name -> rule groups -> rules.
// Only the uid is extracted; full rules come from the provisioning api.
type RulerResponse = BTreeMap<String, Vec<RulerGroup>>;

#[derive(Debug, Deserialize)]
struct RulerGroup {
    #[serde(default)]
    rules: Vec<RulerRule>,
}

#[derive(Debug, Deserialize)]
struct RulerRule {
    grafana_alert: RulerAlert,
}

#[derive(Debug, Deserialize)]
struct RulerAlert {
    uid: String,
}

/// Flattens the nested ruler response into the contained rule uids.
fn flatten_ruler_response(response: RulerResponse) -> Vec<String> {
    response
        .into_values()
        .flatten()
        .flat_map(|group| group.rules)
        .map(|rule| rule.grafana_alert.uid)
        .collect()
}

impl GrafanaClient {
    /// Lists the uids of all alert rules on the instance.
    pub async fn list_alert_rule_uids(&self) -> Result<Vec<String>> {
        let response: RulerResponse = self
            .client
            .get_request("/api/ruler/grafana/api/v1/rules", &[])
            .await?;
        Ok(flatten_ruler_response(response))
    }

    /// Fetches one alert rule by uid.
    pub async fn alert_rule_by_uid(&self, uid: &str) -> Result<AlertRule> {
        self.client
            .get_request(&format!("/api/v1/provisioning/alert-rules/{uid}"), &[])
            .await
    }

    /// Creates an alert rule. The body is projected to the portable subset.
    pub async fn create_alert_rule(&self, rule: &AlertRule) -> Result<serde_json::Value> {
        self.client
            .post_request("/api/v1/provisioning/alert-rules", &rule.portable())
            .await
    }

    /// Updates an alert rule in place, keyed by uid.
    pub async fn update_alert_rule(&self, rule: &AlertRule) -> Result<serde_json::Value> {
        self.client
            .put_request(
                &format!("/api/v1/provisioning/alert-rules/{}", rule.uid),
                &rule.portable(),
            )
            .await
    }

    /// Deletes an alert rule by uid.
    pub async fn delete_alert_rule(&self, uid: &str) -> Result<()> {
        self.client
            .delete_request(&format!("/api/v1/provisioning/alert-rules/{uid}"))
            .await
    }
}
