// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn path_embeds_pod_name() {
    let path = session_map_path(Path::new("/state"), "pod7");
    assert_eq!(path, Path::new("/state/session-map-pod7.json"));
}

#[test]
fn save_and_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_map_path(dir.path(), "pod");

    let mut map = SessionMapFile {
        pod: "pod".into(),
        logs: HashMap::new(),
        refreshed_at: "2026-03-01T10:00:00Z".into(),
    };
    map.logs
        .insert("cc".into(), PathBuf::from("/home/u/.claude/projects/-w/s.jsonl"));
    map.save(&path).unwrap();

    assert_eq!(SessionMapFile::load(&path), Some(map));
}

#[test]
fn corrupt_file_loads_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_map_path(dir.path(), "pod");
    std::fs::write(&path, "}{").unwrap();
    assert_eq!(SessionMapFile::load(&path), None);
}

#[test]
fn sweep_removes_only_session_maps() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("session-map-a.json"), "{}").unwrap();
    std::fs::write(dir.path().join("session-map-b.json"), "{}").unwrap();
    std::fs::write(dir.path().join("panes.json"), "{}").unwrap();
    std::fs::write(dir.path().join("offsets.json"), "{}").unwrap();

    assert_eq!(sweep_session_maps(dir.path()), 2);
    assert!(dir.path().join("panes.json").exists());
    assert!(dir.path().join("offsets.json").exists());
    assert!(!dir.path().join("session-map-a.json").exists());
}
