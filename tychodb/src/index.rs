//! Index Manager (spec §4.9, C9): expression-derived functional indexes,
//! single- or multi-column, numeric-aware.

use tychodb_core::codec::Codec;
use tychodb_core::error::{TychoError, TychoResult};
use tychodb_core::path::FieldPath;
use tychodb_core::registry::safe_name;

use crate::engine::TychoDb;

impl<C: Codec> TychoDb<C> {
	/// Creates `idx_<name>_<safe-T>` on `JsonValue(FullTypeName, <extract per
	/// path>, …)`, numeric-casting each path that is flagged numeric.
	/// Idempotent and transactional (spec §4.9). A single-path slice yields
	/// the single-column form; more than one path yields a composite index.
	pub async fn create_index<T: 'static>(&self, paths: &[FieldPath], name: &str) -> TychoResult<()> {
		if paths.is_empty() {
			return Err(TychoError::InvalidPath("an index needs at least one path".into()));
		}
		validate_index_name(name)?;

		let index_name = format!("idx_{name}_{}", safe_name::<T>());
		let mut columns = String::from("FullTypeName");
		for path in paths {
			columns.push_str(", ");
			if path.is_numeric() {
				columns.push_str(&format!("CAST(JSON_EXTRACT(Data, '{}') AS NUMERIC)", path.as_str()));
			} else {
				columns.push_str(&format!("JSON_EXTRACT(Data, '{}')", path.as_str()));
			}
		}
		let sql = format!("CREATE INDEX IF NOT EXISTS {index_name} ON JsonValue ({columns})");
		let error_index_name = index_name.clone();

		self.supervisor
			.run(move |pool| async move {
				let mut tx = pool.begin().await.map_err(|e| TychoError::index_failed("begin index transaction", Box::new(e)))?;
				sqlx::query(&sql)
					.execute(&mut *tx)
					.await
					.map_err(|e| TychoError::index_failed(format!("create index {error_index_name}"), Box::new(e)))?;
				tx.commit().await.map_err(|e| TychoError::index_failed("commit index creation", Box::new(e)))?;
				Ok(())
			})
			.await
	}
}

/// Rejects anything but a plain SQL identifier, since `name` is spliced
/// directly into `CREATE INDEX` DDL text rather than bound as a parameter
/// (SQLite has no parameter syntax for identifiers).
fn validate_index_name(name: &str) -> TychoResult<()> {
	let mut chars = name.chars();
	let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
	let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
	if name.is_empty() || !first_ok || !rest_ok {
		return Err(TychoError::InvalidPath(format!("`{name}` is not a valid index name (expected a plain identifier)")));
	}
	Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
	use super::*;

	#[test]
	fn accepts_plain_identifiers() {
		validate_index_name("by_int").unwrap();
		validate_index_name("_leading_underscore").unwrap();
	}

	#[test]
	fn rejects_names_with_sql_metacharacters() {
		assert!(validate_index_name("").is_err());
		assert!(validate_index_name("foo ON JsonValue(Key); DROP TABLE JsonValue; --").is_err());
		assert!(validate_index_name("has space").is_err());
		assert!(validate_index_name("1starts_with_digit").is_err());
	}
}
