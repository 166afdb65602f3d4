//! # Grafana Preferences
//!
//! Org-level and team-level preference records.
//!
//! Preferences have no stable identity of their own: the org record is a
//! singleton, and team records are keyed by the team they belong to. Both
//! are kept as untyped JSON so unmodeled preference fields survive a
//! round-trip.

use serde::{Deserialize, Serialize};

use crate::{Result, client::GrafanaClient};

/// A team, as returned by the team search endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Team {
    /// Instance-local numeric id, used in preference endpoint paths.
    pub id: i64,

    /// Stable identifier, portable between instances.
    #[serde(default)]
    pub uid: String,

    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TeamSearchResponse {
    teams: Vec<Team>,
}

const TEAM_SEARCH_PAGE_SIZE: u32 = 1000;

impl GrafanaClient {
    /// Returns the organization preference record.
    pub async fn org_preferences(&self) -> Result<serde_json::Value> {
        self.client.get_request("/api/org/preferences", &[]).await
    }

    /// Overwrites the organization preference record.
    pub async fn update_org_preferences(
        &self,
        preferences: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.client
            .put_request("/api/org/preferences", preferences)
            .await
    }

    /// Lists teams in the organization.
    pub async fn search_teams(&self) -> Result<Vec<Team>> {
        let query = vec![("perpage".to_string(), TEAM_SEARCH_PAGE_SIZE.to_string())];
        let response: TeamSearchResponse =
            self.client.get_request("/api/teams/search", &query).await?;
        Ok(response.teams)
    }

    /// Returns the preference record of a team.
    pub async fn team_preferences(&self, team_id: i64) -> Result<serde_json::Value> {
        self.client
            .get_request(&format!("/api/teams/{team_id}/preferences"), &[])
            .await
    }

    /// Overwrites the preference record of a team.
    pub async fn update_team_preferences(
        &self,
        team_id: i64,
        preferences: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.client
            .put_request(&format!("/api/teams/{team_id}/preferences"), preferences)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_team_search_response_shape() {
        let response: TeamSearchResponse = serde_json::from_value(json!({
            "totalCount": 2,
            "teams": [
                {"id": 1, "uid": "t1", "name": "backend", "email": ""},
                {"id": 2, "name": "frontend"}
            ],
            "page": 1, "perPage": 1000
        }))
        .unwrap();
        assert_eq!(response.teams.len(), 2);
        assert_eq!(response.teams[0].uid, "t1");
        // uid may be absent on older instances
        assert_eq!(response.teams[1].uid, "");
    }
}
