//! Replay law
//!
//! Applying a sequence of mutations directly in memory, and applying the same
//! sequence through the WAL and recovering it on reopen, must end in the same
//! documents, the same identifier counter and the same index state.

use std::path::Path;

use cairndb::{Document, Engine, EngineConfig, Filter, Value};
use proptest::prelude::*;
use serde_json::json;
use tempfile::TempDir;

#[derive(Debug, Clone)]
enum Op {
    Insert { score: Option<i64>, tag: u8 },
    SetScore { target: i64, score: i64 },
    Tag { target: i64, tag: u8 },
    DeleteOne { target: i64 },
    DeleteAll { target: i64 },
    Clear,
    /// Only meaningful for the durable engine
    Checkpoint,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (proptest::option::of(0i64..8), 0u8..3).prop_map(|(score, tag)| Op::Insert { score, tag }),
        2 => (0i64..8, 0i64..8).prop_map(|(target, score)| Op::SetScore { target, score }),
        1 => (0i64..8, 0u8..3).prop_map(|(target, tag)| Op::Tag { target, tag }),
        2 => (0i64..8).prop_map(|target| Op::DeleteOne { target }),
        1 => (0i64..8).prop_map(|target| Op::DeleteAll { target }),
        1 => Just(Op::Clear),
        1 => Just(Op::Checkpoint),
    ]
}

fn doc(json: serde_json::Value) -> Document {
    Document::from_json(json).unwrap()
}

fn durable(dir: &Path) -> EngineConfig {
    EngineConfig {
        checkpoint_on_close: false,
        ..EngineConfig::with_data_dir(dir)
            .with_checkpoint_interval(0)
            .with_index("score")
    }
}

fn apply(engine: &mut Engine, op: &Op) {
    match op {
        Op::Insert { score: Some(score), tag } => {
            engine.insert(doc(json!({"score": score, "tag": tag}))).unwrap();
        }
        Op::Insert { score: None, tag } => {
            engine.insert(doc(json!({"tag": tag}))).unwrap();
        }
        Op::SetScore { target, score } => {
            engine
                .update(&Filter::eq("score", *target), &doc(json!({"score": score})))
                .unwrap();
        }
        Op::Tag { target, tag } => {
            engine
                .update_one(&Filter::eq("score", *target), &doc(json!({"tag": tag})))
                .unwrap();
        }
        Op::DeleteOne { target } => {
            engine.delete_one(&Filter::eq("score", *target)).unwrap();
        }
        Op::DeleteAll { target } => {
            engine.delete(&Filter::lte("score", *target)).unwrap();
        }
        Op::Clear => {
            engine.clear().unwrap();
        }
        Op::Checkpoint => {
            if engine.config().is_durable() {
                engine.checkpoint().unwrap();
            }
        }
    }
}

fn without_timestamps(docs: Vec<Document>) -> Vec<Document> {
    docs.into_iter()
        .map(|mut d| {
            d.remove("_createdAt");
            d.remove("_updatedAt");
            d
        })
        .collect()
}

fn index_shape(engine: &Engine) -> Vec<(String, usize, usize)> {
    engine
        .index_info()
        .into_iter()
        .map(|info| (info.field, info.distinct_values, info.entries))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_replay_matches_direct_application(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let dir = TempDir::new().unwrap();

        let mut direct = Engine::in_memory();
        direct.create_index("score").unwrap();
        let mut logged = Engine::open(durable(dir.path())).unwrap();

        for op in &ops {
            apply(&mut direct, op);
            apply(&mut logged, op);
        }
        let before_crash = logged.find_all();
        drop(logged);

        let replayed = Engine::open(durable(dir.path())).unwrap();

        // Replay restores the exact logged bodies
        prop_assert_eq!(replayed.find_all(), before_crash);
        prop_assert_eq!(
            without_timestamps(replayed.find_all()),
            without_timestamps(direct.find_all())
        );
        prop_assert_eq!(replayed.stats().next_id, direct.stats().next_id);
        prop_assert_eq!(index_shape(&replayed), index_shape(&direct));
        for score in 0i64..8 {
            let value = Value::from(score);
            prop_assert_eq!(
                replayed.lookup_equal("score", &value),
                direct.lookup_equal("score", &value)
            );
        }
    }
}
