use std::sync::Arc;

use qwery_store::{Storage, StorageKey, StoreError};
use serde_json::{json, Value};
use tempfile::TempDir;

fn storage() -> (TempDir, Storage) {
    let dir = tempfile::tempdir().expect("tempdir should be available");
    let storage = Storage::at(dir.path().join("storage"));
    (dir, storage)
}

fn key(segments: &[&str]) -> StorageKey {
    StorageKey::new(segments.iter().copied()).expect("key should be valid")
}

#[tokio::test]
async fn test_write_read_round_trip() {
    let (_dir, storage) = storage();
    let document = json!({
        "name": "warehouse",
        "nested": {"list": [1, 2, 3], "flag": true, "none": null}
    });

    storage
        .write(&key(&["project", "prj_1"]), &document)
        .await
        .expect("write should succeed");
    let read = storage
        .read(&key(&["project", "prj_1"]))
        .await
        .expect("read should succeed");
    assert_eq!(read, document);

    let on_disk = std::fs::read_to_string(storage.path_for(&key(&["project", "prj_1"])))
        .expect("document file should exist");
    assert!(on_disk.contains("\n  \"name\""), "documents are pretty printed");
}

#[tokio::test]
async fn test_write_overwrites() {
    let (_dir, storage) = storage();
    let k = key(&["user", "usr_1"]);
    storage.write(&k, &json!({"v": 1})).await.unwrap();
    storage.write(&k, &json!({"v": 2})).await.unwrap();
    assert_eq!(storage.read(&k).await.unwrap(), json!({"v": 2}));
}

#[tokio::test]
async fn test_read_missing_is_not_found() {
    let (_dir, storage) = storage();
    let err = storage
        .read(&key(&["project", "missing"]))
        .await
        .expect_err("read should fail");
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_read_directory_is_not_not_found() {
    let (_dir, storage) = storage();
    let target = storage.path_for(&key(&["project", "dir"]));
    std::fs::create_dir_all(&target).expect("create dir should succeed");

    let err = storage
        .read(&key(&["project", "dir"]))
        .await
        .expect_err("reading a directory should fail");
    assert!(!err.is_not_found());
    assert!(matches!(err, StoreError::Io(_)));
}

#[tokio::test]
async fn test_read_invalid_json_is_serialization_error() {
    let (_dir, storage) = storage();
    let k = key(&["project", "broken"]);
    let target = storage.path_for(&k);
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, b"{not json").unwrap();

    let err = storage.read(&k).await.expect_err("decode should fail");
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[tokio::test]
async fn test_update_missing_does_not_create() {
    let (_dir, storage) = storage();
    let k = key(&["project", "ghost"]);
    let err = storage
        .update(&k, |doc| doc["x"] = json!(1))
        .await
        .expect_err("update should fail");
    assert!(err.is_not_found());
    assert!(!storage.path_for(&k).exists());
}

#[tokio::test]
async fn test_try_update_failure_writes_nothing() {
    let (_dir, storage) = storage();
    let k = key(&["project", "p"]);
    storage.write(&k, &json!({"count": 1})).await.unwrap();

    let result = storage
        .try_update(&k, |doc| {
            doc["count"] = json!(99);
            Err(StoreError::InvalidInput("rejected".to_string()))
        })
        .await;
    assert!(result.is_err());
    assert_eq!(storage.read(&k).await.unwrap(), json!({"count": 1}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_never_lose_increments() {
    const N: i64 = 50;
    let (_dir, storage) = storage();
    let k = key(&["counter", "c"]);
    storage.write(&k, &json!({"count": 0})).await.unwrap();

    let k = Arc::new(k);
    let mut tasks = Vec::new();
    for _ in 0..N {
        let storage = storage.clone();
        let k = k.clone();
        tasks.push(tokio::spawn(async move {
            storage
                .update(&k, |doc| {
                    let current = doc["count"].as_i64().unwrap_or(0);
                    doc["count"] = json!(current + 1);
                })
                .await
                .expect("update should succeed");
        }));
    }
    for task in tasks {
        task.await.expect("task should not panic");
    }

    let document = storage.read(&k).await.unwrap();
    assert_eq!(document["count"], json!(N));
    assert_eq!(storage.locks().tracked_keys(), 0);
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let (_dir, storage) = storage();
    let k = key(&["project", "p"]);
    storage.write(&k, &json!({})).await.unwrap();

    storage.remove(&k).await.expect("remove should succeed");
    assert!(storage.read(&k).await.unwrap_err().is_not_found());
    storage
        .remove(&k)
        .await
        .expect("removing a missing document should succeed");
}

#[tokio::test]
async fn test_remove_existing_reports_presence() {
    let (_dir, storage) = storage();
    let k = key(&["project", "p"]);
    storage.write(&k, &json!({})).await.unwrap();

    assert!(storage.remove_existing(&k).await.unwrap());
    assert!(!storage.remove_existing(&k).await.unwrap());
    assert!(storage.read(&k).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_remove_existing_propagates_io_errors() {
    let (_dir, storage) = storage();
    let k = key(&["project", "dir"]);
    let target = storage.path_for(&k);
    std::fs::create_dir_all(&target).expect("create dir should succeed");

    let err = storage
        .remove_existing(&k)
        .await
        .expect_err("removing a directory should fail");
    assert!(matches!(err, StoreError::Io(_)));
    assert!(target.exists());
}

#[tokio::test]
async fn test_list_is_sorted_and_recursive() {
    let (_dir, storage) = storage();
    for segments in [
        &["a", "y"][..],
        &["a", "x"][..],
        &["a", "x", "z"][..],
        &["b", "q"][..],
    ] {
        storage.write(&key(segments), &json!({})).await.unwrap();
    }

    let keys = storage.list(&key(&["a"])).await.expect("list should succeed");
    let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["a/x", "a/x/z", "a/y"]);
}

#[tokio::test]
async fn test_list_missing_prefix_is_empty() {
    let (_dir, storage) = storage();
    let keys = storage.list(&key(&["missing"])).await.expect("list should succeed");
    assert!(keys.is_empty());
}

#[tokio::test]
async fn test_list_skips_temporary_and_foreign_files() {
    let (_dir, storage) = storage();
    storage.write(&key(&["a", "doc"]), &json!({})).await.unwrap();
    let dir = storage.root().join("a");
    std::fs::write(dir.join("doc.json.tmp-abc"), b"{}").unwrap();
    std::fs::write(dir.join("notes.txt"), b"hi").unwrap();

    let keys = storage.list(&key(&["a"])).await.unwrap();
    assert_eq!(keys, vec![key(&["a", "doc"])]);
}

#[tokio::test]
async fn test_read_waits_for_writer() {
    use std::time::Duration;

    let (_dir, storage) = storage();
    let k = key(&["project", "p"]);
    storage.write(&k, &json!({"v": 1})).await.unwrap();

    let path = storage.path_for(&k).to_string_lossy().into_owned();
    let guard = storage.locks().write(&path).await;

    let reader = storage.clone();
    let read_key = k.clone();
    let mut pending = tokio::spawn(async move { reader.read(&read_key).await });
    assert!(tokio::time::timeout(Duration::from_millis(20), &mut pending)
        .await
        .is_err());

    drop(guard);
    let value: Value = pending.await.unwrap().unwrap();
    assert_eq!(value, json!({"v": 1}));
}
