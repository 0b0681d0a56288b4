#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

//! Connection Supervisor operational concerns (spec §4.6/§5/§6): cancellation
//! honored mid-operation, the configurable command timeout, and the
//! `use_connection_pooling` pass-through.

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tychodb::{IdValue, TychoConfig, TychoDb};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Record {
	key: String,
	value: i64,
}

async fn connected_db() -> (TychoDb, TempDir) {
	let dir = TempDir::new().expect("create temp dir");
	let config = TychoConfig::new(dir.path()).build();
	let db = TychoDb::new(config).expect("build engine");
	db.registry().register::<Record, _, fn(&IdValue, &IdValue) -> bool>(
		tychodb::field_path!(key: tychodb::PathFlavor::Plain).expect("valid path"),
		|v: &Record| IdValue::Str(v.key.clone().into_boxed_str()),
		None,
	);
	db.connect().await.expect("connect");
	(db, dir)
}

/// Spans more than one write batch window so the token has a chance to be
/// observed mid-transaction, not just at the very first check.
fn many_records(n: i64) -> Vec<Record> {
	(0..n).map(|i| Record { key: format!("k{i}"), value: i }).collect()
}

#[tokio::test]
async fn write_many_rolls_back_when_cancelled_mid_operation() {
	let (db, _dir) = connected_db().await;
	let token = CancellationToken::new();
	let records = many_records(250);

	// Cancel concurrently with the write rather than before it starts, so a
	// stale snapshot taken once up front would miss it.
	let cancel_token = token.clone();
	let canceller = tokio::spawn(async move {
		tokio::task::yield_now().await;
		cancel_token.cancel();
	});

	let result = db.write_many(&records, None, None, Some(&token)).await;
	canceller.await.expect("canceller task");

	match result {
		Ok(true) => {
			// The whole batch landed before cancellation was observed; still a
			// valid outcome, but then every row must be present.
			assert_eq!(db.count::<Record>(None, None).await.expect("count"), 250);
		}
		Err(tychodb::TychoError::Cancelled) => {
			assert_eq!(db.count::<Record>(None, None).await.expect("count"), 0);
		}
		other => panic!("unexpected result: {other:?}"),
	}
}

#[tokio::test]
async fn write_many_honors_a_token_cancelled_before_the_call() {
	let (db, _dir) = connected_db().await;
	let token = CancellationToken::new();
	token.cancel();
	let records = many_records(250);

	let err = db.write_many(&records, None, None, Some(&token)).await.unwrap_err();
	assert!(matches!(err, tychodb::TychoError::Cancelled));
	assert_eq!(db.count::<Record>(None, None).await.expect("count"), 0);
}

#[tokio::test]
async fn read_many_fails_with_cancelled_when_token_is_cancelled() {
	let (db, _dir) = connected_db().await;
	for record in many_records(10) {
		db.write(&record, None, None).await.expect("write");
	}

	let token = CancellationToken::new();
	token.cancel();
	let err = db.read_many::<Record>(None, None, None, None, None, Some(&token)).await.unwrap_err();
	assert!(matches!(err, tychodb::TychoError::Cancelled));
}

#[tokio::test]
async fn read_many_succeeds_with_an_uncancelled_token() {
	let (db, _dir) = connected_db().await;
	for record in many_records(5) {
		db.write(&record, None, None).await.expect("write");
	}

	let token = CancellationToken::new();
	let rows: Vec<Record> = db.read_many(None, None, None, None, None, Some(&token)).await.expect("read many");
	assert_eq!(rows.len(), 5);
}

fn register_record(db: &TychoDb) {
	db.registry().register::<Record, _, fn(&IdValue, &IdValue) -> bool>(
		tychodb::field_path!(key: tychodb::PathFlavor::Plain).expect("valid path"),
		|v: &Record| IdValue::Str(v.key.clone().into_boxed_str()),
		None,
	);
}

#[tokio::test]
async fn disabling_connection_pooling_still_round_trips() {
	let dir = TempDir::new().expect("create temp dir");
	let config = TychoConfig::new(dir.path()).use_connection_pooling(false).build();
	let db = TychoDb::new(config).expect("build engine");
	register_record(&db);
	db.connect().await.expect("connect");

	let value = Record { key: "k".into(), value: 42 };
	db.write(&value, None, None).await.expect("write");
	let read: Option<Record> = db.read_by_key("k", None).await.expect("read");
	assert_eq!(read, Some(value));
}
