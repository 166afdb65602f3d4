//! Per-entity reconciliation
//!
//! One reconciler per entity kind, each split into a pure planning step
//! (decide skip/create/update/delete per item, unit-testable without a
//! server) and a thin apply step that performs the writes and counts the
//! outcomes. Reconcilers are stateless between invocations; the
//! orchestrator refetches the live collection after each kind because
//! later kinds depend on the post-reconciliation state of earlier ones.

use std::fmt;

pub mod alertrules;
pub mod dashboards;
pub mod datasources;
pub mod folders;
pub mod preferences;

/// Import policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Policy {
    /// Additive: existing live entities win, backup fills the gaps.
    Merge,
    /// Destructive: conflicting/foreign live entities are removed before
    /// the backup entities are written.
    Override,
}

/// Outcome counters for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindReport {
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub conflicts: u64,
    pub errored: u64,
}

impl KindReport {
    pub fn has_errors(&self) -> bool {
        self.errored > 0
    }
}

impl fmt::Display for KindReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} updated={} deleted={} skipped={} conflicts={} errors={}",
            self.created, self.updated, self.deleted, self.skipped, self.conflicts, self.errored
        )
    }
}

/// Final per-run summary, printed after the last kind is reconciled.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationReport {
    pub datasources: KindReport,
    pub folders: KindReport,
    pub dashboards: KindReport,
    pub alertrules: KindReport,
    pub preferences: KindReport,
    /// Live dashboards purged before import (override policy only).
    /// Only `deleted` and `errored` are ever set.
    pub purge: KindReport,
}

impl MigrationReport {
    pub fn has_errors(&self) -> bool {
        self.datasources.has_errors()
            || self.folders.has_errors()
            || self.dashboards.has_errors()
            || self.alertrules.has_errors()
            || self.preferences.has_errors()
            || self.purge.has_errors()
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "datasources: {}", self.datasources)?;
        writeln!(f, "folders:     {}", self.folders)?;
        writeln!(f, "dashboards:  {}", self.dashboards)?;
        writeln!(f, "alertrules:  {}", self.alertrules)?;
        write!(f, "preferences: {}", self.preferences)?;
        if self.purge != KindReport::default() {
            write!(
                f,
                "\npurged {} live dashboards, {} failed",
                self.purge.deleted, self.purge.errored
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let mut report = MigrationReport::default();
        report.dashboards.created = 3;
        report.datasources.conflicts = 1;
        let text = report.to_string();
        assert!(text.contains("dashboards:  created=3"));
        assert!(text.contains("conflicts=1"));
        assert!(!text.contains("purged"));
    }

    #[test]
    fn test_has_errors() {
        let mut report = MigrationReport::default();
        assert!(!report.has_errors());
        report.alertrules.errored = 2;
        assert!(report.has_errors());
    }

    #[test]
    fn test_purge_failures_surface_in_summary() {
        let mut report = MigrationReport::default();
        report.purge.deleted = 3;
        report.purge.errored = 1;
        assert!(report.has_errors());
        assert!(report.to_string().contains("purged 3 live dashboards, 1 failed"));
    }
}
