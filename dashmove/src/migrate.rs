//! Migration orchestration
//!
//! The export run captures one instance into a [`Snapshot`]; the import run
//! replays a snapshot against a target instance in dependency order:
//! optional purge, datasources, folders, dashboards, alert rules,
//! preferences. The live collection of each kind is fetched fresh right
//! before that kind is planned, because earlier kinds change the state
//! later kinds depend on (folder creation in particular).
//!
//! Per-item write failures are counted in the report and never abort the
//! run; only connectivity loss or a malformed snapshot is fatal.

use std::{
    collections::HashSet,
    io::{self, IsTerminal},
    path::{Path, PathBuf},
};

use anyhow::Result;
use grafana_api::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::{
    filter::strip_excluded,
    purge::purge_dashboards,
    reconcile::{self, KindReport, MigrationReport, Policy},
    resolve::FolderIndex,
    rewrite::{fold_refs_to_id, fold_refs_to_uid},
    snapshot::{
        PreferenceSet, Snapshot, SnapshotFormat, TeamPreferences, write_snapshot,
    },
};

/// Spinner on stderr for long fetch loops; inert when stderr is not a tty.
struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    fn new(message: &str) -> Self {
        if io::stderr().is_terminal() {
            let bar = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            bar.set_style(style);
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            bar.set_message(message.to_string());
            Self { bar: Some(bar) }
        } else {
            Self { bar: None }
        }
    }

    fn set_message(&self, message: String) {
        if let Some(bar) = &self.bar {
            bar.set_message(message);
        }
    }

    fn finish(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }
}

/// Captures the instance behind `client` into a snapshot file.
///
/// Dashboard bodies are stored in portable form: folder references
/// rewritten to uids and marked panels stripped. Returns the written path.
pub async fn run_export(
    client: &GrafanaClient,
    tag: Option<&str>,
    location: &Path,
    format: SnapshotFormat,
) -> Result<PathBuf> {
    let progress = ProgressReporter::new("listing folders");
    // the folder list omits the implicit General folder; fetch it by id
    // so the snapshot carries the complete set
    let mut folders = client.list_folders().await?;
    match client.folder_by_id(GENERAL_FOLDER_ID).await {
        Ok(general) => folders.push(general),
        Err(err) => warn!("fetch General folder: {err}"),
    }
    let folder_index = FolderIndex::new(&folders);

    progress.set_message("fetching dashboards".to_string());
    let hits = client.search_dashboards(tag).await?;
    let mut dashboards = Vec::new();
    for hit in hits.iter().filter(|hit| !hit.is_folder()) {
        progress.set_message(format!("fetching dashboard {}", hit.title));
        match client.dashboard_by_uid(&hit.uid).await {
            Ok(mut entry) => {
                entry.dashboard =
                    strip_excluded(fold_refs_to_uid(entry.dashboard, &folder_index));
                dashboards.push(entry);
            }
            Err(err) => warn!("fetch dashboard {}: {err}", hit.uid),
        }
    }

    progress.set_message("fetching datasources".to_string());
    // the list endpoint returns summary records; refetch by uid for the
    // full body, keeping the summary if the refetch fails
    let mut datasources = Vec::new();
    for summary in client.list_datasources().await? {
        match client.datasource_by_uid(&summary.uid).await {
            Ok(full) => datasources.push(full),
            Err(err) => {
                warn!("fetch datasource {}: {err}", summary.uid);
                datasources.push(summary);
            }
        }
    }

    progress.set_message("fetching alert rules".to_string());
    let mut alertrules = Vec::new();
    for uid in client.list_alert_rule_uids().await? {
        match client.alert_rule_by_uid(&uid).await {
            Ok(rule) => alertrules.push(rule),
            Err(err) => warn!("fetch alert rule {uid}: {err}"),
        }
    }

    progress.set_message("fetching preferences".to_string());
    let preferences = Some(export_preferences(client).await?);

    let snapshot = Snapshot {
        folders,
        dashboards,
        datasources,
        alertrules,
        preferences,
    };

    let url = &client.get_config().base_url;
    let path = write_snapshot(location, url, format, &snapshot)?;
    progress.finish("export complete");
    info!(
        "exported {} dashboards, {} folders, {} datasources, {} alert rules to {}",
        snapshot.dashboards.len(),
        snapshot.folders.len(),
        snapshot.datasources.len(),
        snapshot.alertrules.len(),
        path.display()
    );
    Ok(path)
}

async fn export_preferences(client: &GrafanaClient) -> Result<PreferenceSet> {
    let org = client.org_preferences().await?;
    let mut teams = Vec::new();
    for team in client.search_teams().await? {
        match client.team_preferences(team.id).await {
            Ok(preferences) => teams.push(TeamPreferences {
                team_uid: team.uid,
                team_name: team.name,
                preferences,
            }),
            Err(err) => warn!("fetch preferences of team {}: {err}", team.name),
        }
    }
    Ok(PreferenceSet { org, teams })
}

/// Replays a snapshot against the instance behind `client`.
///
/// Safe to repeat: a second run against an unchanged target plans only
/// skips and writes nothing new.
pub async fn run_import(
    client: &GrafanaClient,
    snapshot: &Snapshot,
    policy: Policy,
) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    if policy == Policy::Override {
        let hits = client.search_dashboards(None).await?;
        purge_dashboards(client, &hits, &mut report.purge).await;
    }

    let live_datasources = client.list_datasources().await?;
    let ds_plan = reconcile::datasources::plan(&snapshot.datasources, &live_datasources, policy);
    reconcile::datasources::apply(client, &snapshot.datasources, &ds_plan, &mut report.datasources)
        .await;

    let live_folders = client.list_folders().await?;
    let folder_plan = reconcile::folders::plan(&snapshot.folders, &live_folders, policy);
    let failed_folder_uids =
        reconcile::folders::apply(client, &folder_plan, &mut report.folders).await;

    // refetch: folder ids on the target are only known after creation
    let live_folders = client.list_folders().await?;
    let folder_index = FolderIndex::new(&live_folders);
    let live_folder_uids: HashSet<String> = live_folders
        .iter()
        .map(|folder| folder.uid.clone())
        .filter(|uid| !failed_folder_uids.contains(uid))
        .collect();

    let live_dashboard_uids: HashSet<String> = client
        .search_dashboards(None)
        .await?
        .into_iter()
        .filter(|hit| !hit.is_folder())
        .map(|hit| hit.uid)
        .collect();

    let dashboards = localize_dashboards(snapshot, &folder_index, &mut report.dashboards);
    let dash_plan =
        reconcile::dashboards::plan(&dashboards, &live_dashboard_uids, &live_folder_uids);
    reconcile::dashboards::apply(client, &dash_plan, &mut report.dashboards).await;

    let live_rule_uids: HashSet<String> =
        client.list_alert_rule_uids().await?.into_iter().collect();
    let rule_plan = reconcile::alertrules::plan(&snapshot.alertrules, &live_rule_uids, policy);
    reconcile::alertrules::apply(client, &rule_plan, &mut report.alertrules).await;

    if let Some(preferences) = &snapshot.preferences {
        let live_teams = client.search_teams().await?;
        let pref_plan = reconcile::preferences::plan(&preferences.teams, &live_teams);
        reconcile::preferences::apply(client, preferences, &pref_plan, &mut report.preferences)
            .await;
    }

    Ok(report)
}

/// Rewrites each backup dashboard body into the target's local id form.
/// A dashboard whose rewrite fails (dangling folder reference) is dropped
/// from the batch and counted as an error.
fn localize_dashboards(
    snapshot: &Snapshot,
    folder_index: &FolderIndex,
    report: &mut KindReport,
) -> Vec<DashboardEntry> {
    snapshot
        .dashboards
        .iter()
        .filter_map(|entry| {
            match fold_refs_to_id(entry.dashboard.clone(), folder_index) {
                Ok(dashboard) => Some(DashboardEntry {
                    dashboard,
                    meta: entry.meta.clone(),
                }),
                Err(err) => {
                    warn!(
                        "dashboard {} not imported: {err}",
                        entry.uid().unwrap_or("(no uid)")
                    );
                    report.errored += 1;
                    None
                }
            }
        })
        .collect()
}
