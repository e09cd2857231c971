//! Durability Tests
//!
//! Tests for:
//! - Recovery on open (snapshot + WAL replay)
//! - Checkpoint and WAL truncation
//! - Snapshot save / load round trips and validation
//! - Torn WAL tails and halt-on-corruption

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use cairndb::snapshot::{self, meta_path_for};
use cairndb::wal::{WalReader, WAL_DIR, WAL_FILE};
use cairndb::{Document, Engine, EngineConfig, Filter, Value};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn doc(json: serde_json::Value) -> Document {
    Document::from_json(json).unwrap()
}

/// Durable config that never checkpoints on its own
fn manual_config(dir: &Path) -> EngineConfig {
    EngineConfig {
        checkpoint_on_close: false,
        ..EngineConfig::with_data_dir(dir).with_checkpoint_interval(0)
    }
}

fn wal_path(dir: &Path) -> std::path::PathBuf {
    dir.join(WAL_DIR).join(WAL_FILE)
}

fn wal_len(dir: &Path) -> usize {
    WalReader::open(&wal_path(dir)).unwrap().read_all().unwrap().len()
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn test_reopen_replays_wal() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = Engine::open(manual_config(dir.path())).unwrap();
        engine.insert(doc(json!({"name": "Alice", "age": 30}))).unwrap();
        engine.insert(doc(json!({"name": "Bob", "age": 25}))).unwrap();
        engine
            .update(&Filter::eq("name", "Alice"), &doc(json!({"age": 31})))
            .unwrap();
        engine.delete_one(&Filter::eq("name", "Bob")).unwrap();
        // Dropped without close: simulates a crash after the last fsync
    }
    assert_eq!(wal_len(dir.path()), 4);

    let engine = Engine::open(manual_config(dir.path())).unwrap();
    assert_eq!(engine.len(), 1);
    assert_eq!(engine.get(1).unwrap().get("age"), Some(&Value::from(31)));
    assert!(engine.get(2).is_none());

    let stats = engine.stats();
    assert_eq!(stats.recovered_entries, 4);
    assert_eq!(stats.next_id, 3);
}

#[test]
fn test_configured_indexes_are_built_on_open() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = Engine::open(manual_config(dir.path())).unwrap();
        engine.insert(doc(json!({"email": "a@example.com"}))).unwrap();
    }

    let config = manual_config(dir.path()).with_index("email");
    let engine = Engine::open(config).unwrap();
    let lookup = engine.lookup_equal("email", &Value::from("a@example.com"));
    assert_eq!(lookup.ids().map(|ids| ids.len()), Some(1));
}

#[test]
fn test_replay_law() {
    // Direct application in memory
    let mut direct = Engine::in_memory();
    direct.create_index("group").unwrap();

    // Same operations through the WAL, then replayed from empty
    let dir = TempDir::new().unwrap();
    let mut logged = Engine::open(manual_config(dir.path()).with_index("group")).unwrap();

    for engine in [&mut direct, &mut logged] {
        for i in 0..20 {
            engine.insert(doc(json!({"_id": i + 1, "n": i, "group": i % 3}))).unwrap();
        }
        engine.update(&Filter::eq("group", 1), &doc(json!({"group": 2}))).unwrap();
        engine.delete(&Filter::lt("n", 4)).unwrap();
        engine.update_one(&Filter::gte("n", 10), &doc(json!({"tag": "x"}))).unwrap();
    }
    drop(logged);

    let replayed = Engine::open(manual_config(dir.path()).with_index("group")).unwrap();

    let strip = |docs: Vec<Document>| -> Vec<Document> {
        docs.into_iter()
            .map(|mut d| {
                d.remove("_createdAt");
                d.remove("_updatedAt");
                d
            })
            .collect()
    };
    assert_eq!(strip(replayed.find_all()), strip(direct.find_all()));
    for group in 0..3 {
        let value = Value::from(group);
        assert_eq!(
            replayed.lookup_equal("group", &value),
            direct.lookup_equal("group", &value)
        );
    }
}

// =============================================================================
// Checkpoint
// =============================================================================

#[test]
fn test_checkpoint_truncates_wal_and_keeps_state() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = Engine::open(manual_config(dir.path())).unwrap();
        engine.create_index("age").unwrap();
        engine.insert(doc(json!({"age": 30}))).unwrap();
        engine.insert(doc(json!({"age": 25}))).unwrap();
        engine.delete(&Filter::eq("age", 25)).unwrap();

        let meta = engine.checkpoint().unwrap();
        assert_eq!(meta.document_count, 1);
        assert_eq!(wal_len(dir.path()), 0);

        engine.insert(doc(json!({"age": 41}))).unwrap();
    }

    let engine = Engine::open(manual_config(dir.path())).unwrap();
    assert_eq!(engine.len(), 2);
    // The deleted id 2 stays retired across the checkpoint
    assert_eq!(engine.find_all().iter().filter_map(Document::id).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(engine.stats().next_id, 4);
    // Index definitions travel with the snapshot
    assert_eq!(engine.index_info().len(), 1);
    assert_eq!(engine.stats().recovered_entries, 1);
}

#[test]
fn test_close_checkpoints_by_default() {
    let dir = TempDir::new().unwrap();
    let mut engine = Engine::open(EngineConfig::with_data_dir(dir.path())).unwrap();
    engine.insert(doc(json!({"name": "Alice"}))).unwrap();
    engine.close().unwrap();

    assert!(dir.path().join("data.ddb").exists());
    assert!(meta_path_for(&dir.path().join("data.ddb")).exists());
    assert_eq!(wal_len(dir.path()), 0);

    let engine = Engine::open(EngineConfig::with_data_dir(dir.path())).unwrap();
    assert_eq!(engine.len(), 1);
}

#[test]
fn test_crash_between_snapshot_and_truncate_is_harmless() {
    let dir = TempDir::new().unwrap();
    let mut engine = Engine::open(manual_config(dir.path())).unwrap();
    engine.insert(doc(json!({"n": 1}))).unwrap();
    engine.insert(doc(json!({"n": 2}))).unwrap();
    engine.update_one(&Filter::eq("n", 1), &doc(json!({"n": 10}))).unwrap();

    // Snapshot written, WAL not yet truncated
    engine.save_to_file(&dir.path().join("data.ddb")).unwrap();
    drop(engine);
    assert_eq!(wal_len(dir.path()), 3);

    let engine = Engine::open(manual_config(dir.path())).unwrap();
    assert_eq!(engine.len(), 2);
    assert_eq!(engine.count(Some(&Filter::eq("n", 10))).unwrap(), 1);
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn test_save_then_load_into_fresh_engine() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.ddb");

    let mut source = Engine::in_memory();
    source.create_index("age").unwrap();
    for (name, age) in [("Alice", 30), ("Bob", 25), ("Carol", 35)] {
        source.insert(doc(json!({"name": name, "age": age, "tags": [name]}))).unwrap();
    }
    source.delete_one(&Filter::eq("name", "Carol")).unwrap();
    source.save_to_file(&path).unwrap();

    let mut target = Engine::in_memory();
    assert_eq!(target.load_from_file(&path).unwrap(), 2);
    assert_eq!(target.find_all(), source.find_all());
    assert_eq!(target.index_info().len(), 1);
    assert_eq!(target.insert(doc(json!({}))).unwrap().id(), Some(4));
}

#[test]
fn test_load_failure_leaves_engine_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.ddb");
    fs::write(&path, r#"{"version": "1.0", "documents": [{"_id": 1}, {"_id": 1}]}"#).unwrap();

    let mut engine = Engine::in_memory();
    engine.insert(doc(json!({"name": "kept"}))).unwrap();

    let err = engine.load_from_file(&path).unwrap_err();
    assert!(err.is_format());
    assert_eq!(engine.len(), 1);

    let err = engine.load_from_file(&dir.path().join("missing.ddb")).unwrap_err();
    assert!(!err.is_format());
    assert_eq!(engine.len(), 1);
}

#[test]
fn test_tampered_snapshot_fails_checksum() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.ddb");

    let mut engine = Engine::in_memory();
    engine.insert(doc(json!({"name": "Alice"}))).unwrap();
    engine.save_to_file(&path).unwrap();

    let tampered = fs::read_to_string(&path).unwrap().replace("Alice", "Mallory");
    fs::write(&path, tampered).unwrap();

    let err = snapshot::load(&path).unwrap_err();
    assert_eq!(err.code().code(), "CAIRN_SNAPSHOT_CHECKSUM_MISMATCH");
}

#[test]
fn test_load_into_durable_engine_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let export = dir.path().join("export.ddb");
    let mut source = Engine::in_memory();
    source.insert(doc(json!({"name": "imported"}))).unwrap();
    source.save_to_file(&export).unwrap();

    let data = dir.path().join("data");
    {
        let mut engine = Engine::open(manual_config(&data)).unwrap();
        engine.insert(doc(json!({"name": "replaced"}))).unwrap();
        engine.load_from_file(&export).unwrap();
    }

    let engine = Engine::open(manual_config(&data)).unwrap();
    assert_eq!(engine.len(), 1);
    assert_eq!(engine.find_one(&Filter::exists("name")).unwrap().unwrap().get("name"), Some(&Value::from("imported")));
}

// =============================================================================
// WAL Damage
// =============================================================================

#[test]
fn test_torn_tail_is_ignored_on_open() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = Engine::open(manual_config(dir.path())).unwrap();
        engine.insert(doc(json!({"name": "Alice"}))).unwrap();
    }

    let mut file = OpenOptions::new().append(true).open(wal_path(dir.path())).unwrap();
    file.write_all(br#"{"type":"insert","timestamp":"2026-01-0"#).unwrap();
    drop(file);

    let mut engine = Engine::open(manual_config(dir.path())).unwrap();
    assert_eq!(engine.len(), 1);

    // Appends after the repaired tail replay cleanly
    engine.insert(doc(json!({"name": "Bob"}))).unwrap();
    drop(engine);
    let engine = Engine::open(manual_config(dir.path())).unwrap();
    assert_eq!(engine.len(), 2);
}

#[test]
fn test_corrupt_record_halts_open() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = Engine::open(manual_config(dir.path())).unwrap();
        engine.insert(doc(json!({"name": "Alice"}))).unwrap();
    }

    let mut file = OpenOptions::new().append(true).open(wal_path(dir.path())).unwrap();
    file.write_all(b"{\"type\":\"delete\"}\n").unwrap();
    drop(file);

    let err = Engine::open(manual_config(dir.path())).unwrap_err();
    assert!(err.is_format());
    assert_eq!(err.code(), "CAIRN_WAL_CORRUPTION");
}
