//! Identity resolution
//!
//! Entities carry two identifiers: the stable uid (portable between
//! instances) and the instance-local numeric id (reassigned on creation).
//! Matching a backup entity against a live collection goes by uid first;
//! datasources additionally fall back to the name, with the plugin type as
//! a secondary check. A name match with a differing type is a conflict and
//! is never merged.

use std::collections::HashMap;

use grafana_api::prelude::*;

/// Bidirectional uid <-> local-id mapping for one instance's folder set.
///
/// Built from the live folders of whichever instance the caller is talking
/// to; dashboard reference rewriting needs the mapping of the current
/// target, not the one the snapshot was taken from.
#[derive(Debug, Default)]
pub struct FolderIndex {
    by_uid: HashMap<String, i64>,
    by_id: HashMap<i64, String>,
}

impl FolderIndex {
    pub fn new(folders: &[Folder]) -> Self {
        let mut index = FolderIndex::default();
        for folder in folders {
            index.by_uid.insert(folder.uid.clone(), folder.id);
            index.by_id.insert(folder.id, folder.uid.clone());
        }
        index
    }

    /// Resolves a stable uid to the instance-local folder id.
    /// `None` means the folder does not exist on this instance.
    pub fn local_id(&self, uid: &str) -> Option<i64> {
        self.by_uid.get(uid).copied()
    }

    /// Resolves an instance-local folder id to the stable uid.
    pub fn uid_for(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }
}

/// Outcome of matching one backup datasource against the live collection.
#[derive(Debug, PartialEq, Eq)]
pub enum DatasourceMatch<'live> {
    /// Exact uid match.
    Uid(&'live Datasource),
    /// Name match with equal plugin type (uid differs).
    Name(&'live Datasource),
    /// Name match with a differing plugin type. Never merged.
    TypeConflict(&'live Datasource),
    /// No live counterpart.
    None,
}

/// Matches in strict priority order: uid, then name with a type check.
pub fn match_datasource<'live>(
    backup: &Datasource,
    live: &'live [Datasource],
) -> DatasourceMatch<'live> {
    if let Some(found) = live.iter().find(|ds| ds.uid == backup.uid) {
        return DatasourceMatch::Uid(found);
    }
    if let Some(found) = live.iter().find(|ds| ds.name == backup.name) {
        if found.ds_type == backup.ds_type {
            return DatasourceMatch::Name(found);
        }
        return DatasourceMatch::TypeConflict(found);
    }
    DatasourceMatch::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn folder(id: i64, uid: &str) -> Folder {
        serde_json::from_value(json!({"id": id, "uid": uid, "title": uid})).unwrap()
    }

    fn datasource(uid: &str, name: &str, ds_type: &str) -> Datasource {
        serde_json::from_value(json!({"uid": uid, "name": name, "type": ds_type})).unwrap()
    }

    #[test]
    fn test_folder_index_both_directions() {
        let index = FolderIndex::new(&[folder(0, "general"), folder(7, "infra")]);
        assert_eq!(index.local_id("infra"), Some(7));
        assert_eq!(index.uid_for(7), Some("infra"));
        assert_eq!(index.local_id("missing"), None);
        assert_eq!(index.uid_for(99), None);
    }

    #[test]
    fn test_uid_match_wins_over_name() {
        let live = vec![
            datasource("a", "prod", "postgres"),
            datasource("b", "other", "postgres"),
        ];
        let backup = datasource("b", "prod", "mysql");
        // uid "b" exists, so the name collision with "a" is irrelevant
        assert_eq!(match_datasource(&backup, &live), DatasourceMatch::Uid(&live[1]));
    }

    #[test]
    fn test_name_match_requires_equal_type() {
        let live = vec![datasource("a", "prod", "postgres")];

        let same_type = datasource("x", "prod", "postgres");
        assert_eq!(
            match_datasource(&same_type, &live),
            DatasourceMatch::Name(&live[0])
        );

        let other_type = datasource("x", "prod", "mysql");
        assert_eq!(
            match_datasource(&other_type, &live),
            DatasourceMatch::TypeConflict(&live[0])
        );
    }

    #[test]
    fn test_no_match() {
        let live = vec![datasource("a", "prod", "postgres")];
        let backup = datasource("x", "staging", "mysql");
        assert_eq!(match_datasource(&backup, &live), DatasourceMatch::None);
    }
}
