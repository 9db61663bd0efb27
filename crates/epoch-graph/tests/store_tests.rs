//! Filesystem store, snapshot and output tests

use epoch_core::{
    CenturyTag, DateBound, EpochError, Evidence, KnowledgeBase, PersonEntity, PersonEvent,
    PersonSource, PublicationStatus,
};
use epoch_extractor::InferencePipeline;
use epoch_graph::{shard_for, write_summary, FsPersonStore, SnapshotStore, TurtleWriter};
use tempfile::TempDir;

async fn seeded_store(dir: &TempDir) -> FsPersonStore {
    let store = FsPersonStore::at(dir.path().join("persons"));

    store
        .save_person(
            &PersonEntity::new("P100")
                .with_event(PersonEvent::new("PersonBirth").with_on_year("1500"))
                .with_event(PersonEvent::new("PersonDeath").with_on_year("1550")),
        )
        .await
        .unwrap();
    store
        .save_person(&PersonEntity::new("P101").with_link("P100", "hasFather"))
        .await
        .unwrap();
    store
        .save_person(
            &PersonEntity::new("P102")
                .with_status(PublicationStatus::Withdrawn)
                .with_event(PersonEvent::new("PersonDeath").with_when("17XX")),
        )
        .await
        .unwrap();

    store
}

#[tokio::test]
async fn test_list_and_load() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;

    // Non-person files are ignored
    let stray = store.root().join("README.json");
    tokio::fs::write(&stray, "{}").await.unwrap();

    let ids = store.list_persons().await.unwrap();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["P100", "P101", "P102"]);

    let person = store.load_person("P101").await.unwrap();
    assert_eq!(person.links[0].target, "P100");
    assert!(store
        .path_for("P101")
        .starts_with(store.root().join(shard_for("P101"))));
}

#[tokio::test]
async fn test_misplaced_person_files_are_not_listed() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let record = r#"{"id":"P777","events":[{"type":"PersonDeath","onYear":"1600"}]}"#;

    tokio::fs::write(store.root().join("P777.json"), record).await.unwrap();
    // Shards are hex, so "zz" is never the right one
    let wrong_shard = store.root().join("zz");
    tokio::fs::create_dir_all(&wrong_shard).await.unwrap();
    tokio::fs::write(wrong_shard.join("P778.json"), record).await.unwrap();

    let mut ids = store.list_persons().await.unwrap();
    ids.sort();
    assert_eq!(ids, vec!["P100", "P101", "P102"]);

    let kb = InferencePipeline::default().run_batch(&store).await.unwrap();
    assert!(kb.get("P777").is_none());
    assert_eq!(kb.counters().malformed, 0);
}

#[tokio::test]
async fn test_missing_and_malformed_records() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;

    let missing = store.load_person("P999").await;
    assert!(matches!(missing, Err(EpochError::NotFound(_))));

    let path = store.path_for("P200");
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let broken = store.load_person("P200").await;
    assert!(matches!(broken, Err(EpochError::MalformedRecord { .. })));
}

#[tokio::test]
async fn test_batch_over_filesystem() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;

    let path = store.path_for("P200");
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let kb = InferencePipeline::default().run_batch(&store).await.unwrap();

    assert_eq!(kb.counters().direct, 1);
    assert_eq!(kb.counters().inferred, 1);
    assert_eq!(kb.counters().skipped, 1);
    assert_eq!(kb.counters().malformed, 1);
    assert_eq!(kb.get("P100").unwrap().centuries, vec![CenturyTag(16)]);
    assert_eq!(
        kb.get("P101").unwrap().centuries,
        vec![CenturyTag(16), CenturyTag(15)]
    );
}

#[tokio::test]
async fn test_snapshot_round_trip_and_resume() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let pipeline = InferencePipeline::default();
    let kb = pipeline.run_batch(&store).await.unwrap();

    let snapshots = SnapshotStore::new(dir.path().join("out").join("kb.json"));
    snapshots.save(&kb).await.unwrap();

    let snapshot = snapshots.load().await.unwrap();
    assert_eq!(
        snapshot.persons["P100"],
        Evidence::Dated(DateBound::new(1500, 1550))
    );

    let resumed = pipeline.resume(snapshot);
    assert_eq!(resumed.diagnostics(), kb.diagnostics());
    assert_eq!(
        resumed.associations().collect::<Vec<_>>(),
        kb.associations().collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_missing_snapshot_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let result = SnapshotStore::new(dir.path().join("kb.json")).load().await;
    assert!(matches!(result, Err(EpochError::StorageUnavailable(_))));
}

#[tokio::test]
async fn test_turtle_and_summary_output() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let kb = InferencePipeline::default().run_batch(&store).await.unwrap();

    let ttl = dir.path().join("centuries.ttl");
    let written = TurtleWriter::default().write(&ttl, &kb).await.unwrap();
    assert_eq!(written, 3);

    let turtle = tokio::fs::read_to_string(&ttl).await.unwrap();
    assert!(turtle.contains("bdr:P100 tmp:associatedCentury 16 ."));
    assert!(turtle.contains("bdr:P101 tmp:associatedCentury 15 ."));

    let summary_path = dir.path().join("summary.json");
    write_summary(&summary_path, &kb.summary()).await.unwrap();
    let summary: serde_json::Value =
        serde_json::from_str(&tokio::fs::read_to_string(&summary_path).await.unwrap()).unwrap();
    assert_eq!(summary["counters"]["direct"], 1);
    assert_eq!(summary["histogram"]["16"], 2);
}

#[tokio::test]
async fn test_empty_store() {
    let dir = TempDir::new().unwrap();
    tokio::fs::create_dir_all(dir.path().join("persons")).await.unwrap();
    let store = FsPersonStore::at(dir.path().join("persons"));

    let kb: KnowledgeBase = InferencePipeline::default().run_batch(&store).await.unwrap();
    assert!(kb.is_empty());
    assert_eq!(kb.diagnostics().histogram_total(), 0);
}
