#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Blob Engine scenario coverage (spec §8 scenario 6: blob round-trip).

use tempfile::TempDir;
use tychodb::{TychoConfig, TychoDb};

async fn connected_db() -> (TychoDb, TempDir) {
	let dir = TempDir::new().expect("create temp dir");
	let config = TychoConfig::new(dir.path()).build();
	let db = TychoDb::new(config).expect("build engine");
	db.connect().await.expect("connect");
	(db, dir)
}

#[tokio::test]
async fn blob_round_trip() {
	let (db, _dir) = connected_db().await;
	let payload = b"This is a test message";

	let wrote = db.write_blob(payload, "Test", None).await.expect("write blob");
	assert!(wrote);

	let read = db.read_blob("Test", None).await.expect("read blob").expect("blob present");
	assert_eq!(read, payload);
}

#[tokio::test]
async fn blob_delete_then_not_exists() {
	let (db, _dir) = connected_db().await;
	db.write_blob(b"data", "k", None).await.expect("write blob");

	let deleted = db.delete_blob("k", None).await.expect("delete blob");
	assert!(deleted);

	assert!(!db.exists_blob("k", None).await.expect("exists check"));
	assert_eq!(db.read_blob("k", None).await.expect("read blob"), None);
}

#[tokio::test]
async fn blobs_do_not_share_namespace_with_documents() {
	let (db, _dir) = connected_db().await;
	db.write_blob(b"blob-data", "shared-key", None).await.expect("write blob");

	assert!(db.exists_blob("shared-key", None).await.expect("exists check"));
}

#[tokio::test]
async fn delete_blobs_by_partition_clears_only_that_partition() {
	let (db, _dir) = connected_db().await;
	db.write_blob(b"a", "k1", Some("p1")).await.expect("write blob p1");
	db.write_blob(b"b", "k2", Some("p2")).await.expect("write blob p2");

	let removed = db.delete_blobs("p1").await.expect("delete blobs");
	assert_eq!(removed, 1);
	assert!(!db.exists_blob("k1", Some("p1")).await.expect("exists check"));
	assert!(db.exists_blob("k2", Some("p2")).await.expect("exists check"));
}
