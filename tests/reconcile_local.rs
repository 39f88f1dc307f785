// tests/reconcile_local.rs

//! Reconciler behaviour against the filesystem datastore.

use std::fs;

use stepjob::datastore::{FlowDatastore, LocalDatastore, MetadataReconciler, Reconciler};
use stepjob::types::{MetadataKind, TaskIdentity};
use stepjob_test_utils::builders::TaskIdentityBuilder;
use stepjob_test_utils::init_tracing;

/// Seed the datastore with metadata records for the attempt.
fn seed_metadata(datastore: &LocalDatastore, identity: &TaskIdentity) {
    // task_datastore creates the attempt layout, including metadata/.
    datastore
        .task_datastore(identity)
        .expect("datastore should open");
    let dir = datastore.attempt_dir(identity).join("metadata");
    fs::write(dir.join("attempt_ok.json"), r#"{"value": true}"#).unwrap();
    fs::write(
        dir.join("task_end.json"),
        r#"{"ts": 1724800000, "fields": {"exit": 0}}"#,
    )
    .unwrap();
}

fn cache_files(cache_root: &std::path::Path, identity: &TaskIdentity) -> Vec<(String, String)> {
    let dir = cache_root
        .join(&identity.flow_name)
        .join(&identity.run_id)
        .join(&identity.step_name)
        .join(&identity.task_id);
    let mut files: Vec<(String, String)> = fs::read_dir(&dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| {
                    (
                        e.file_name().to_string_lossy().into_owned(),
                        fs::read_to_string(e.path()).unwrap(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

#[test]
fn sync_copies_records_into_local_cache() {
    init_tracing();

    let store_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let identity = TaskIdentityBuilder::new().build();

    let datastore = LocalDatastore::new(store_dir.path());
    seed_metadata(&datastore, &identity);

    let reconciler = MetadataReconciler::new(MetadataKind::Local, cache_dir.path());
    reconciler.sync(&datastore, &identity);

    let files = cache_files(cache_dir.path(), &identity);
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].0, "attempt_ok.json");
    assert_eq!(files[1].0, "task_end.json");
}

#[test]
fn sync_twice_is_idempotent() {
    init_tracing();

    let store_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let identity = TaskIdentityBuilder::new().attempt(1).build();

    let datastore = LocalDatastore::new(store_dir.path());
    seed_metadata(&datastore, &identity);

    let reconciler = MetadataReconciler::new(MetadataKind::Local, cache_dir.path());
    reconciler.sync(&datastore, &identity);
    let first = cache_files(cache_dir.path(), &identity);

    reconciler.sync(&datastore, &identity);
    let second = cache_files(cache_dir.path(), &identity);

    assert_eq!(first, second);
}

#[test]
fn service_backend_is_a_noop() {
    init_tracing();

    let store_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let identity = TaskIdentityBuilder::new().build();

    let datastore = LocalDatastore::new(store_dir.path());
    seed_metadata(&datastore, &identity);

    let reconciler = MetadataReconciler::new(MetadataKind::Service, cache_dir.path());
    reconciler.sync(&datastore, &identity);

    assert!(cache_files(cache_dir.path(), &identity).is_empty());
}

#[test]
fn sync_survives_missing_datastore() {
    init_tracing();

    // Datastore root never created: sync logs and swallows the failure.
    let cache_dir = tempfile::tempdir().unwrap();
    let identity = TaskIdentityBuilder::new().build();

    let datastore = LocalDatastore::new("/nonexistent/stepjob-datastore");
    let reconciler = MetadataReconciler::new(MetadataKind::Local, cache_dir.path());

    // Must not panic.
    reconciler.sync(&datastore, &identity);
}
