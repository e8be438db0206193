//! Sync engine tests.
//!
//! Covers the reconcile decision table and end-to-end reconciliation of two
//! note files sharing one backup.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]

use fnote::io::ScriptedTerminal;
use fnote::services::reconcile;
use fnote::storage::{FilesystemBackup, MemoryBackup};
use fnote::{BackupClient, BackupEntry, Note, NoteContext, NoteFile, SyncAction, WriteMode};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_case::test_case;

const T: f64 = 1_700_000_000.0;

fn notes(lines: &[&str]) -> Vec<Note> {
    lines.iter().map(|l| Note::from(*l)).collect()
}

fn remote(score: f64) -> BackupEntry {
    BackupEntry::from_notes(score, &notes(&["remote:1", "remote:2"])).unwrap()
}

// ============================================================================
// Decision table
// ============================================================================

#[test_case(true, 3, Some(T - 100.0), &["local:1"], "pull" ; "new file with remote entries pulls")]
#[test_case(true, 0, None, &[], "noop" ; "new file with empty remote does nothing")]
#[test_case(false, 0, None, &["local:1"], "push" ; "existing file with empty remote pushes")]
#[test_case(false, 0, None, &[], "noop" ; "existing empty file with empty remote does nothing")]
#[test_case(false, 2, Some(T), &["local:1"], "noop" ; "equal timestamps do nothing")]
#[test_case(false, 2, Some(T + 1.0), &["local:1"], "pull" ; "newer remote pulls")]
#[test_case(false, 2, Some(T - 1.0), &["local:1"], "push" ; "newer local pushes")]
#[test_case(false, 2, Some(T - 1.0), &[], "noop" ; "newer empty local does not push")]
fn test_reconcile_table(
    is_new: bool,
    remote_size: usize,
    latest_score: Option<f64>,
    local: &[&str],
    expected: &str,
) {
    let local = notes(local);
    let action = reconcile(is_new, T, &local, remote_size, || {
        Ok(latest_score.map(remote))
    })
    .unwrap();

    assert_eq!(action.as_str(), expected);
    match action {
        SyncAction::Pull(pulled) => assert_eq!(pulled, notes(&["remote:1", "remote:2"])),
        SyncAction::Push(pushed) => assert_eq!(pushed, local),
        SyncAction::NoOp => {},
    }
}

// ============================================================================
// Service execution
// ============================================================================

#[test]
fn test_push_uses_file_mtime_as_score() {
    let dir = TempDir::new().unwrap();
    let file = NoteFile::new(dir.path().join("notes.txt"));
    file.ensure_exists().unwrap();
    file.write_notes(&notes(&["a:1", "b:2"]), WriteMode::Append)
        .unwrap();
    let mtime = file.modified_at().unwrap();

    let backup = Arc::new(MemoryBackup::new());
    let context = NoteContext::from_parts(
        file,
        Some(backup.clone()),
        Arc::new(ScriptedTerminal::default()),
    );

    let action = context.startup_check().unwrap();
    assert_eq!(action, SyncAction::Push(notes(&["a:1", "b:2"])));

    let entries = backup.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].score, mtime);
    assert_eq!(entries[0].payload, r#"["a:1","b:2"]"#);

    // Pushed snapshot now matches the file.
    assert_eq!(context.startup_check().unwrap(), SyncAction::NoOp);
}

#[test]
fn test_newer_remote_overwrites_local() {
    let dir = TempDir::new().unwrap();
    let file = NoteFile::new(dir.path().join("notes.txt"));
    file.ensure_exists().unwrap();
    file.write_notes(&notes(&["local:1"]), WriteMode::Append)
        .unwrap();
    let newer = file.modified_at().unwrap() + 60.0;

    let backup = Arc::new(MemoryBackup::with_entries(vec![
        remote(1.0),
        remote(newer),
    ]));
    let context = NoteContext::from_parts(
        file,
        Some(backup.clone()),
        Arc::new(ScriptedTerminal::default()),
    );

    let action = context.startup_check().unwrap();
    assert!(matches!(action, SyncAction::Pull(_)));
    assert_eq!(
        context.store().file().read_notes().unwrap(),
        notes(&["remote:1", "remote:2"])
    );
    // Pull never adds entries.
    assert_eq!(backup.size().unwrap(), 2);
}

// ============================================================================
// Two machines sharing a backup
// ============================================================================

fn machine(root: &TempDir, name: &str, backup_dir: &std::path::Path) -> NoteContext {
    let file = NoteFile::new(root.path().join(name).join("notes.txt"));
    let backup: Arc<dyn BackupClient> =
        Arc::new(FilesystemBackup::new(backup_dir, "fnote:backup:shared").unwrap());
    NoteContext::from_parts(file, Some(backup), Arc::new(ScriptedTerminal::default()))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_edits_propagate_between_machines() {
    let root = TempDir::new().unwrap();
    let backup_dir = root.path().join("backup");

    let laptop = machine(&root, "laptop", &backup_dir);
    assert_eq!(laptop.startup_check().unwrap(), SyncAction::NoOp);

    laptop.store().add(&Note::from("wifi:pw1")).unwrap();
    assert!(
        laptop
            .store()
            .background()
            .wait_idle_timeout(Duration::from_secs(10))
            .await
    );

    let desktop = machine(&root, "desktop", &backup_dir);
    assert_eq!(
        desktop.startup_check().unwrap(),
        SyncAction::Pull(notes(&["wifi:pw1"]))
    );
    assert_eq!(desktop.startup_check().unwrap(), SyncAction::NoOp);

    tokio::time::sleep(Duration::from_millis(20)).await;
    desktop.store().modify(&Note::from("wifi:pw2")).unwrap();
    assert!(
        desktop
            .store()
            .background()
            .wait_idle_timeout(Duration::from_secs(10))
            .await
    );

    assert_eq!(
        laptop.startup_check().unwrap(),
        SyncAction::Pull(notes(&["wifi:pw2"]))
    );
    assert_eq!(
        laptop.store().find("wifi", true, true, false).unwrap(),
        notes(&["wifi:pw2"])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_background_sync_publishes_events() {
    let dir = TempDir::new().unwrap();
    let file = NoteFile::new(dir.path().join("notes.txt"));
    let backup = Arc::new(MemoryBackup::new());
    let context = NoteContext::from_parts(
        file,
        Some(backup.clone()),
        Arc::new(ScriptedTerminal::default()),
    );
    context.startup_check().unwrap();

    let mut events = context.store().background().subscribe();
    context
        .store()
        .write(&notes(&["k:v"]), WriteMode::Append)
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.outcome, Ok(SyncAction::Push(notes(&["k:v"]))));
    assert_eq!(backup.size().unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backup_matches_file_after_rapid_writes() {
    let dir = TempDir::new().unwrap();
    let file = NoteFile::new(dir.path().join("notes.txt"));
    let backup = Arc::new(MemoryBackup::new());
    let context = NoteContext::from_parts(
        file,
        Some(backup.clone()),
        Arc::new(ScriptedTerminal::default()),
    );
    context.startup_check().unwrap();

    let store = context.store();
    store.add(&Note::from("a:1")).unwrap();
    store.add(&Note::from("b:1")).unwrap();

    for i in 0..200 {
        store.modify(&Note::from(format!("a:{i}x"))).unwrap();
        if i % 10 == 0 {
            store.add(&Note::from(format!("extra{i}:v"))).unwrap();
        }
        assert!(
            store
                .background()
                .wait_idle_timeout(Duration::from_secs(10))
                .await
        );

        let local = store.file().read_notes().unwrap();
        let latest = backup.latest().unwrap().unwrap();
        assert_eq!(latest.notes().unwrap(), local, "backup stale after write {i}");
        assert_eq!(latest.score, store.file().modified_at().unwrap());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_background_failure_does_not_fail_write() {
    let dir = TempDir::new().unwrap();
    let file = NoteFile::new(dir.path().join("notes.txt"));
    file.ensure_exists().unwrap();

    let corrupt: Arc<dyn BackupClient> = Arc::new(MemoryBackup::with_entries(vec![BackupEntry {
        score: 4_000_000_000.0,
        payload: "not json".to_string(),
    }]));
    let context =
        NoteContext::from_parts(file, Some(corrupt), Arc::new(ScriptedTerminal::default()));
    let mut events = context.store().background().subscribe();

    context.store().add(&Note::from("k:v")).unwrap();

    let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(event.is_error());
    assert_eq!(
        context.store().file().read_notes().unwrap(),
        notes(&["k:v"])
    );
}
