//! Preference reconciliation
//!
//! The org preference record is a singleton and is always written as-is.
//! Team preference records carry the team's uid and name from the source
//! instance; they are matched against the target's teams by uid first and
//! name second, because team uids only exist on newer instances. Records
//! whose team does not exist on the target are dropped, since team
//! creation is out of scope here.

use grafana_api::prelude::*;
use tracing::{debug, info, warn};

use crate::reconcile::KindReport;
use crate::snapshot::{PreferenceSet, TeamPreferences};

/// Planned target for one backup team preference record.
#[derive(Debug, PartialEq)]
pub enum TeamPrefAction<'a> {
    /// Write to the live team with this id.
    Write { team_id: i64, prefs: &'a TeamPreferences },
    /// No live team matches the record.
    NoTeam,
}

/// Matches backup team preference records against the live teams. Pure.
pub fn plan<'a>(backup: &'a [TeamPreferences], live: &[Team]) -> Vec<TeamPrefAction<'a>> {
    backup
        .iter()
        .map(|prefs| {
            let matched = live
                .iter()
                .find(|team| !prefs.team_uid.is_empty() && team.uid == prefs.team_uid)
                .or_else(|| live.iter().find(|team| team.name == prefs.team_name));
            match matched {
                Some(team) => TeamPrefAction::Write {
                    team_id: team.id,
                    prefs,
                },
                None => TeamPrefAction::NoTeam,
            }
        })
        .collect()
}

/// Writes the org record and the matched team records.
pub async fn apply(
    client: &GrafanaClient,
    backup: &PreferenceSet,
    plan: &[TeamPrefAction<'_>],
    report: &mut KindReport,
) {
    match client.update_org_preferences(&backup.org).await {
        Ok(_) => {
            info!("imported org preferences");
            report.updated += 1;
        }
        Err(err) => {
            warn!("update org preferences: {err}");
            report.errored += 1;
        }
    }

    for action in plan {
        match action {
            TeamPrefAction::Write { team_id, prefs } => {
                match client
                    .update_team_preferences(*team_id, &prefs.preferences)
                    .await
                {
                    Ok(_) => {
                        info!("imported preferences for team {}", prefs.team_name);
                        report.updated += 1;
                    }
                    Err(err) => {
                        warn!("update team {} preferences: {err}", prefs.team_name);
                        report.errored += 1;
                    }
                }
            }
            TeamPrefAction::NoTeam => {
                debug!("dropping preference record for a team absent on the target");
                report.skipped += 1;
            }
        }
    }
}
