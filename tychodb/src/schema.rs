//! Query Catalog (spec §4.5, C5): schema bootstrap, compatibility precheck,
//! and the constant SQL templates the rest of the crate reuses.

use sqlx::{Row, SqlitePool};
use tychodb_core::error::{TychoError, TychoResult};

/// Table and column names, factored out once so the rest of the crate never
/// repeats a string literal for them.
pub mod names {
	pub const DOCUMENT_TABLE: &str = "JsonValue";
	pub const BLOB_TABLE: &str = "StreamValue";
}

/// Minimum SQLite version assumed to carry built-in JSON support without
/// needing to check compile options (spec §4.5).
const MIN_BUILTIN_JSON_VERSION: (u32, u32) = (3, 38);

/// Runs the compatibility precheck, then creates the document table, blob
/// table, and four covering indexes if they don't already exist. Runs once,
/// right after the connection is opened (spec §4.5, §4.6 `connect()`).
pub(crate) async fn bootstrap(pool: &SqlitePool) -> TychoResult<()> {
	check_json_support(pool).await?;

	// Pragmas that change the connection's safety/locking level must run
	// outside any transaction; SQLite rejects them mid-transaction.
	sqlx::query("PRAGMA journal_mode=WAL")
		.execute(pool)
		.await
		.map_err(|e| TychoError::write_failed("set journal_mode", Box::new(e)))?;
	sqlx::query("PRAGMA synchronous=NORMAL")
		.execute(pool)
		.await
		.map_err(|e| TychoError::write_failed("set synchronous", Box::new(e)))?;
	sqlx::query("PRAGMA locking_mode=EXCLUSIVE")
		.execute(pool)
		.await
		.map_err(|e| TychoError::write_failed("set locking_mode", Box::new(e)))?;
	sqlx::query("PRAGMA auto_vacuum=INCREMENTAL")
		.execute(pool)
		.await
		.map_err(|e| TychoError::write_failed("set auto_vacuum", Box::new(e)))?;

	let mut tx = pool.begin().await.map_err(|e| TychoError::write_failed("begin schema transaction", Box::new(e)))?;

	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
			Key TEXT NOT NULL,
			FullTypeName TEXT NOT NULL,
			Partition TEXT NOT NULL,
			Data JSON NOT NULL,
			PRIMARY KEY (Key, FullTypeName, Partition)
		)",
		names::DOCUMENT_TABLE
	))
	.execute(&mut *tx)
	.await
	.map_err(|e| TychoError::write_failed("create JsonValue table", Box::new(e)))?;

	for (name, columns) in [
		("idx_jsonvalue_type", "FullTypeName"),
		("idx_jsonvalue_type_partition", "FullTypeName, Partition"),
		("idx_jsonvalue_key_type", "Key, FullTypeName"),
		("idx_jsonvalue_key_type_partition", "Key, FullTypeName, Partition"),
	] {
		let sql = format!("CREATE INDEX IF NOT EXISTS {name} ON {} ({columns})", names::DOCUMENT_TABLE);
		sqlx::query(&sql)
			.execute(&mut *tx)
			.await
			.map_err(|e| TychoError::index_failed(format!("create {name}"), Box::new(e)))?;
	}

	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
			Key TEXT NOT NULL,
			Partition TEXT NOT NULL,
			Data BLOB,
			PRIMARY KEY (Key, Partition)
		)",
		names::BLOB_TABLE
	))
	.execute(&mut *tx)
	.await
	.map_err(|e| TychoError::write_failed("create StreamValue table", Box::new(e)))?;

	sqlx::query(&format!("CREATE INDEX IF NOT EXISTS idx_streamvalue_key_partition ON {} (Key, Partition)", names::BLOB_TABLE))
		.execute(&mut *tx)
		.await
		.map_err(|e| TychoError::index_failed("create idx_streamvalue_key_partition", Box::new(e)))?;

	tx.commit().await.map_err(|e| TychoError::write_failed("commit schema bootstrap", Box::new(e)))?;

	tracing::info!("schema bootstrap complete");
	Ok(())
}

/// Queries the engine's version; if at least 3.38, assumes built-in JSON
/// support. Otherwise enumerates compile options looking for the JSON1
/// feature tag. Fails with `JsonUnsupported` if neither holds (spec §4.5).
async fn check_json_support(pool: &SqlitePool) -> TychoResult<()> {
	let version: String = sqlx::query_scalar("SELECT sqlite_version()")
		.fetch_one(pool)
		.await
		.map_err(|e| TychoError::read_failed("query sqlite_version()", Box::new(e)))?;

	if let Some((major, minor)) = parse_major_minor(&version) {
		if (major, minor) >= MIN_BUILTIN_JSON_VERSION {
			return Ok(());
		}
	}

	let rows = sqlx::query("PRAGMA compile_options")
		.fetch_all(pool)
		.await
		.map_err(|e| TychoError::read_failed("query compile_options", Box::new(e)))?;

	let has_json1 = rows
		.iter()
		.filter_map(|row| row.try_get::<String, _>(0).ok())
		.any(|opt| opt.eq_ignore_ascii_case("ENABLE_JSON1"));

	if has_json1 {
		Ok(())
	} else {
		Err(TychoError::JsonUnsupported)
	}
}

fn parse_major_minor(version: &str) -> Option<(u32, u32)> {
	let mut parts = version.split('.');
	let major = parts.next()?.parse().ok()?;
	let minor = parts.next()?.parse().ok()?;
	Some((major, minor))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
	use super::*;

	#[test]
	fn parses_major_minor_from_version_string() {
		assert_eq!(parse_major_minor("3.45.1"), Some((3, 45)));
		assert_eq!(parse_major_minor("3.37"), Some((3, 37)));
		assert_eq!(parse_major_minor("garbage"), None);
	}
}
