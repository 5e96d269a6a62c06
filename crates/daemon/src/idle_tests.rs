// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::FakeClock;

fn detector(
    dirs: IndexMap<Role, PathBuf>,
    clock: &FakeClock,
) -> IdleDetector<FakeClock> {
    IdleDetector::new(dirs, Duration::from_secs(2 * 60 * 60), clock.clone())
}

fn project_with_log(dir: &std::path::Path, role: &str) -> PathBuf {
    let project = dir.join(role);
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join("session.jsonl"), "{}\n").unwrap();
    project
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[test]
fn active_until_first_injection() {
    let clock = FakeClock::new();
    let detector = detector(IndexMap::new(), &clock);
    assert_eq!(detector.status(), IdleStatus::Active);
}

#[test]
fn idle_when_logs_predate_injection() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    // Anchor the fake clock to wall time so file mtimes are comparable.
    clock.set_epoch_ms(now_ms());

    let mut dirs = IndexMap::new();
    dirs.insert(Role::new("cc"), project_with_log(dir.path(), "cc"));
    let detector = detector(dirs, &clock);

    // Injection lands after the log was written; grace covers the gap.
    clock.advance(Duration::from_secs(5 * 60));
    detector.note_injection();
    clock.advance(Duration::from_secs(5 * 60));

    assert_eq!(detector.status(), IdleStatus::AllIdle);
}

#[test]
fn recent_log_activity_reads_active() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(now_ms());

    let mut dirs = IndexMap::new();
    let project = project_with_log(dir.path(), "cc");
    dirs.insert(Role::new("cc"), project.clone());
    let detector = detector(dirs, &clock);

    // Injection an hour "ago" on the fake clock, then a fresh write.
    clock.set_epoch_ms(now_ms().saturating_sub(60 * 60 * 1000));
    detector.note_injection();
    clock.set_epoch_ms(now_ms());
    std::fs::write(project.join("session.jsonl"), "{}\n{}\n").unwrap();

    assert_eq!(detector.status(), IdleStatus::Active);
}

#[test]
fn backstop_overrides_idle_skip() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(now_ms());

    let mut dirs = IndexMap::new();
    dirs.insert(Role::new("cc"), project_with_log(dir.path(), "cc"));
    let detector = detector(dirs, &clock);

    detector.note_injection();
    clock.advance(Duration::from_secs(3 * 60 * 60));

    assert_eq!(detector.status(), IdleStatus::Backstop);
}

#[test]
fn missing_logs_read_as_idle() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(now_ms());

    let mut dirs = IndexMap::new();
    dirs.insert(Role::new("cc"), dir.path().join("empty"));
    let detector = detector(dirs, &clock);

    detector.note_injection();
    clock.advance(Duration::from_secs(5 * 60));
    assert_eq!(detector.status(), IdleStatus::AllIdle);
}
