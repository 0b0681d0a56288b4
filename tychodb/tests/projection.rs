#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Projection Engine coverage (spec §4.10, C10): extracting subtrees/fields
//! instead of full documents, with and without keys.

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tychodb::{field_path, Filter, IdValue, PathFlavor, TychoConfig, TychoDb};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Account {
	key: String,
	balance: f64,
}

async fn connected_db() -> (TychoDb, TempDir) {
	let dir = TempDir::new().expect("create temp dir");
	let config = TychoConfig::new(dir.path()).build();
	let db = TychoDb::new(config).expect("build engine");
	db.registry().register::<Account, _, fn(&IdValue, &IdValue) -> bool>(
		field_path!(key: PathFlavor::Plain).expect("valid path"),
		|v: &Account| IdValue::Str(v.key.clone().into_boxed_str()),
		None,
	);
	db.connect().await.expect("connect");
	(db, dir)
}

#[tokio::test]
async fn read_projected_extracts_single_field() {
	let (db, _dir) = connected_db().await;
	db.write(&Account { key: "a".into(), balance: 10.5 }, None, None).await.expect("write");
	db.write(&Account { key: "b".into(), balance: 20.25 }, None, None).await.expect("write");

	let balance_path = field_path!(balance: PathFlavor::Numeric).expect("valid path");
	let mut balances: Vec<f64> = db.read_projected::<Account, f64>(&balance_path, None, None, None, None).await.expect("read projected");
	balances.sort_by(|a, b| a.partial_cmp(b).unwrap());
	assert_eq!(balances, vec![10.5, 20.25]);
}

#[tokio::test]
async fn read_projected_with_keys_pairs_key_and_value() {
	let (db, _dir) = connected_db().await;
	db.write(&Account { key: "only".into(), balance: 99.0 }, None, None).await.expect("write");

	let balance_path = field_path!(balance: PathFlavor::Numeric).expect("valid path");
	let with_keys: Vec<(String, f64)> =
		db.read_projected_with_keys::<Account, f64>(&balance_path, None, None, None, None).await.expect("read projected with keys");
	assert_eq!(with_keys, vec![("only".to_string(), 99.0)]);
}

#[tokio::test]
async fn read_projected_honors_filter() {
	let (db, _dir) = connected_db().await;
	db.write(&Account { key: "a".into(), balance: 10.0 }, None, None).await.expect("write");
	db.write(&Account { key: "b".into(), balance: 200.0 }, None, None).await.expect("write");

	let balance_path = field_path!(balance: PathFlavor::Numeric).expect("valid path");
	let mut filter = Filter::new();
	filter.greater_than(balance_path.clone(), 100.0);

	let balances: Vec<f64> =
		db.read_projected::<Account, f64>(&balance_path, None, Some(&filter), None, None).await.expect("read projected");
	assert_eq!(balances, vec![200.0]);
}
