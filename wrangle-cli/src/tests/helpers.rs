//! Test helpers for laying out extracts, rules and outputs in a temp dir.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

pub(super) const SAMPLE_OSM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
 <node id="1" lat="36.1" lon="-115.1" user="alice" uid="10" version="1" changeset="5" timestamp="2016-01-01T00:00:00Z">
  <tag k="addr:state" v="nv"/>
  <tag k="amenity" v="cafe"/>
 </node>
 <node id="2" lat="36.2" lon="-115.2" user="bob" uid="11" version="1" changeset="6" timestamp="2016-01-02T00:00:00Z"/>
 <way id="3" user="alice" uid="10" version="2" changeset="7" timestamp="2016-01-03T00:00:00Z">
  <nd ref="1"/>
  <nd ref="2"/>
  <tag k="addr:street" v="Main St"/>
 </way>
</osm>
"#;

pub(super) const NV_RULES: &str = r#"{
    "street_types": ["Street"],
    "street_synonyms": {"St": "Street"},
    "state": {"expected": "nv"},
    "city": {"expected": "Las Vegas"}
}"#;

#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace path");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, contents).expect("write workspace file");
        path
    }

    pub(super) fn sample_osm(&self) -> Utf8PathBuf {
        self.write("sample.osm", SAMPLE_OSM)
    }

    pub(super) fn nv_rules(&self) -> Utf8PathBuf {
        self.write("rules.json", NV_RULES)
    }

    pub(super) fn output_dir(&self) -> Utf8PathBuf {
        self.root.join("tables")
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("db/map.db")
    }
}

/// Decode the JSON a command wrote to its output buffer.
pub(super) fn json_output(buffer: &[u8]) -> serde_json::Value {
    serde_json::from_slice(buffer).expect("command output should be JSON")
}
