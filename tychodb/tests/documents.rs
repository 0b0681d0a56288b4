#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Document Engine round-trip and scenario coverage (spec §8's concrete
//! scenarios 1-3, plus the stated invariants).

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tychodb::{IdValue, TychoConfig, TychoDb};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct TestClassA {
	string_property: String,
	int_property: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct TestClassB {
	string_property: String,
	double_property: f64,
}

async fn connected_db() -> (TychoDb, TempDir) {
	let dir = TempDir::new().expect("create temp dir");
	let config = TychoConfig::new(dir.path()).build();
	let db = TychoDb::new(config).expect("build engine");
	db.registry().register::<TestClassA, _, fn(&IdValue, &IdValue) -> bool>(
		tychodb::field_path!(string_property: tychodb::PathFlavor::Plain).expect("valid path"),
		|v: &TestClassA| IdValue::Str(v.string_property.clone().into_boxed_str()),
		None,
	);
	db.registry().register::<TestClassB, _, fn(&IdValue, &IdValue) -> bool>(
		tychodb::field_path!(string_property: tychodb::PathFlavor::Plain).expect("valid path"),
		|v: &TestClassB| IdValue::Str(v.string_property.clone().into_boxed_str()),
		None,
	);
	db.connect().await.expect("connect");
	(db, dir)
}

#[tokio::test]
async fn basic_insert_read() {
	let (db, _dir) = connected_db().await;
	let value = TestClassA { string_property: "Test String".into(), int_property: 1984 };

	let wrote = db.write(&value, None, None).await.expect("write");
	assert!(wrote);

	let read: Option<TestClassA> = db.read_by_key("Test String", None).await.expect("read");
	assert_eq!(read, Some(value));
}

#[tokio::test]
async fn two_types_same_key_are_independently_readable() {
	let (db, _dir) = connected_db().await;
	let a = TestClassA { string_property: "k".into(), int_property: 1984 };
	let b = TestClassB { string_property: "k".into(), double_property: 1999.0 };

	db.write(&a, None, None).await.expect("write a");
	db.write(&b, None, None).await.expect("write b");

	let read_a: TestClassA = db.read_by_key("k", None).await.expect("read a").expect("a present");
	let read_b: TestClassB = db.read_by_key("k", None).await.expect("read b").expect("b present");
	assert_eq!(read_a.int_property, 1984);
	assert_eq!(read_b.double_property, 1999.0);
}

#[tokio::test]
async fn two_partitions_same_key_are_independently_readable() {
	let (db, _dir) = connected_db().await;
	let p1 = TestClassA { string_property: "k".into(), int_property: 1984 };
	let p2 = TestClassA { string_property: "k".into(), int_property: 1999 };

	db.write(&p1, None, Some("p1")).await.expect("write p1");
	db.write(&p2, None, Some("p2")).await.expect("write p2");

	let read_p1: TestClassA = db.read_by_key("k", Some("p1")).await.expect("read p1").expect("present");
	let read_p2: TestClassA = db.read_by_key("k", Some("p2")).await.expect("read p2").expect("present");
	assert_eq!(read_p1.int_property, 1984);
	assert_eq!(read_p2.int_property, 1999);
}

#[tokio::test]
async fn write_then_delete_then_not_exists() {
	let (db, _dir) = connected_db().await;
	let value = TestClassA { string_property: "gone".into(), int_property: 1 };

	db.write(&value, None, None).await.expect("write");
	let deleted = db.delete_by_key::<TestClassA>("gone", None).await.expect("delete");
	assert!(deleted);

	let exists = db.exists_by_key::<TestClassA>("gone", None).await.expect("exists check");
	assert!(!exists);
}

#[tokio::test]
async fn write_replaces_on_same_triple() {
	let (db, _dir) = connected_db().await;
	let first = TestClassA { string_property: "k".into(), int_property: 1 };
	let second = TestClassA { string_property: "k".into(), int_property: 2 };

	db.write(&first, None, None).await.expect("write first");
	db.write(&second, None, None).await.expect("write second");

	let read: TestClassA = db.read_by_key("k", None).await.expect("read").expect("present");
	assert_eq!(read.int_property, 2);
	assert_eq!(db.count::<TestClassA>(None, None).await.expect("count"), 1);
}

#[tokio::test]
async fn count_matches_read_many_length() {
	let (db, _dir) = connected_db().await;
	for i in 0..5 {
		let value = TestClassA { string_property: format!("k{i}"), int_property: i };
		db.write(&value, None, None).await.expect("write");
	}

	let count = db.count::<TestClassA>(None, None).await.expect("count");
	let rows: Vec<TestClassA> = db.read_many(None, None, None, None, None, None).await.expect("read many");
	assert_eq!(count, rows.len());
	assert_eq!(count, 5);
}

#[tokio::test]
async fn delete_many_then_count_zero() {
	let (db, _dir) = connected_db().await;
	for i in 0..3 {
		let value = TestClassA { string_property: format!("k{i}"), int_property: i };
		db.write(&value, None, Some("scratch")).await.expect("write");
	}

	db.delete_many::<TestClassA>(Some("scratch"), None).await.expect("delete many");
	assert_eq!(db.count::<TestClassA>(Some("scratch"), None).await.expect("count"), 0);
}

#[tokio::test]
async fn read_by_key_for_absent_row_is_none() {
	let (db, _dir) = connected_db().await;
	let read: Option<TestClassA> = db.read_by_key("missing", None).await.expect("read");
	assert!(read.is_none());
}

#[tokio::test]
async fn operations_before_connect_fail_with_not_connected() {
	let dir = TempDir::new().expect("create temp dir");
	let config = TychoConfig::new(dir.path()).build();
	let db = TychoDb::new(config).expect("build engine");
	db.registry().register_by_convention::<TestClassA>();

	let err = db.read_by_key::<TestClassA>("anything", None).await.unwrap_err();
	assert!(matches!(err, tychodb::TychoError::NotConnected));
}
