//! Snapshot persistence
//!
//! A snapshot is an immutable captured copy of one instance's state,
//! written once at export and replayed any number of times at import.
//! Two interchangeable encodings are supported: a compact native binary
//! one (CBOR) and a portable indented-JSON one. The reconciler never sees
//! the encoding; it operates on the decoded [`Snapshot`] record.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use grafana_api::prelude::*;
use serde::{Deserialize, Serialize};

/// Everything captured from an instance in one export run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub folders: Vec<Folder>,
    pub dashboards: Vec<DashboardEntry>,
    pub datasources: Vec<Datasource>,
    pub alertrules: Vec<AlertRule>,

    /// Absent in snapshots written before preference migration existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferenceSet>,
}

/// Org-level and team-level preference records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferenceSet {
    /// The singleton org preference record.
    pub org: serde_json::Value,
    pub teams: Vec<TeamPreferences>,
}

/// Preference record of one team, keyed by the team's stable uid with the
/// name kept as a fallback match key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPreferences {
    pub team_uid: String,
    pub team_name: String,
    pub preferences: serde_json::Value,
}

/// On-disk snapshot encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SnapshotFormat {
    /// Portable indented JSON
    Json,
    /// Compact binary (CBOR)
    Native,
}

impl SnapshotFormat {
    pub fn codec(self) -> Box<dyn SnapshotCodec> {
        match self {
            SnapshotFormat::Json => Box::new(JsonCodec),
            SnapshotFormat::Native => Box::new(NativeCodec),
        }
    }
}

/// Encode/decode capability for one snapshot format.
pub trait SnapshotCodec {
    fn encode(&self, snapshot: &Snapshot) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<Snapshot>;
    fn extension(&self) -> &'static str;
}

/// Portable structured-text encoding (indented JSON).
pub struct JsonCodec;

impl SnapshotCodec for JsonCodec {
    fn encode(&self, snapshot: &Snapshot) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(snapshot).context("encoding snapshot as json")
    }

    fn decode(&self, bytes: &[u8]) -> Result<Snapshot> {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| anyhow!("malformed json snapshot at {}: {}", err.path(), err))
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

/// Compact native binary encoding (CBOR).
pub struct NativeCodec;

impl SnapshotCodec for NativeCodec {
    fn encode(&self, snapshot: &Snapshot) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(snapshot, &mut bytes).context("encoding snapshot as cbor")?;
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Snapshot> {
        ciborium::de::from_reader(bytes).context("malformed native snapshot")
    }

    fn extension(&self) -> &'static str {
        "dump"
    }
}

/// Reads and decodes a snapshot file. A decode failure is fatal and occurs
/// before any write to the target.
pub fn load_snapshot(path: &Path, format: SnapshotFormat) -> Result<Snapshot> {
    let bytes =
        fs::read(path).with_context(|| format!("reading snapshot {}", path.display()))?;
    format.codec().decode(&bytes)
}

/// Encodes and writes a snapshot. If `location` is a directory, the file
/// name is derived from the instance url and the current local time.
pub fn write_snapshot(
    location: &Path,
    url: &str,
    format: SnapshotFormat,
    snapshot: &Snapshot,
) -> Result<PathBuf> {
    let codec = format.codec();
    let path = if location.is_dir() {
        location.join(auto_file_name(url, codec.extension()))
    } else {
        location.to_path_buf()
    };
    let bytes = codec.encode(snapshot)?;
    fs::write(&path, bytes).with_context(|| format!("writing snapshot {}", path.display()))?;
    Ok(path)
}

// host + timestamp + extension, with characters unsuitable for filenames removed
fn auto_file_name(url: &str, extension: &str) -> String {
    let host = url.split("://").nth(1).unwrap_or(url);
    let timestamp = Local::now().to_rfc3339();
    let stem = format!("{host}_{timestamp}").replace([':', '/'], "");
    format!("{stem}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            folders: vec![serde_json::from_value(
                json!({"id": 3, "uid": "f1", "title": "Infra"}),
            )
            .unwrap()],
            dashboards: vec![serde_json::from_value(json!({
                "dashboard": {"uid": "d1", "title": "CPU", "id": 9, "panels": []},
                "meta": {"folderUid": "f1"}
            }))
            .unwrap()],
            datasources: vec![serde_json::from_value(
                json!({"uid": "pg1", "name": "prod", "type": "postgres"}),
            )
            .unwrap()],
            alertrules: vec![],
            preferences: Some(PreferenceSet {
                org: json!({"theme": "dark"}),
                teams: vec![TeamPreferences {
                    team_uid: "t1".into(),
                    team_name: "backend".into(),
                    preferences: json!({"theme": "light"}),
                }],
            }),
        }
    }

    #[test]
    fn test_roundtrip_both_codecs() {
        let snapshot = sample_snapshot();
        for format in [SnapshotFormat::Json, SnapshotFormat::Native] {
            let codec = format.codec();
            let bytes = codec.encode(&snapshot).unwrap();
            let decoded = codec.decode(&bytes).unwrap();
            assert_eq!(decoded.folders[0].uid, "f1");
            assert_eq!(decoded.dashboards[0].uid(), Some("d1"));
            assert_eq!(decoded.datasources[0].name, "prod");
            assert_eq!(
                decoded.preferences.unwrap().teams[0].team_uid,
                "t1",
                "{format}"
            );
        }
    }

    #[test]
    fn test_decode_failure_is_error() {
        assert!(JsonCodec.decode(b"{\"folders\": 42}").is_err());
        assert!(NativeCodec.decode(b"not cbor").is_err());
    }

    #[test]
    fn test_snapshot_without_preferences_decodes() {
        let bytes = br#"{"folders": [], "dashboards": [], "datasources": [], "alertrules": []}"#;
        let snapshot = JsonCodec.decode(bytes).unwrap();
        assert!(snapshot.preferences.is_none());
    }

    #[test]
    fn test_write_to_directory_auto_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(
            dir.path(),
            "https://grafana.local:3000",
            SnapshotFormat::Json,
            &sample_snapshot(),
        )
        .unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("grafana.local"));
        assert!(name.ends_with(".json"));
        assert!(!name.contains(':'));
    }
}
