//! Blob Engine (spec §4.8, C8): write / read / exist / delete for binary
//! streams, keyed the same way as documents but sharing no namespace with
//! them (`StreamValue` is a separate table).
//!
//! The spec's reference shape opens a randomly-writable blob handle by
//! rowid and streams into it; `sqlx`'s SQLite driver doesn't expose that
//! low-level `sqlite3_blob_open` API, so this emulates it the way spec §4.8
//! explicitly sanctions: one bound `BLOB` parameter per write/read, inside a
//! transaction for the write so a failed insert never leaves a partial row.

use tychodb_core::codec::Codec;
use tychodb_core::error::{TychoError, TychoResult};
use tychodb_core::key::Partition;

use crate::engine::TychoDb;

impl<C: Codec> TychoDb<C> {
	/// Inserts-or-replaces the blob at `(key, partition)`. Returns true iff
	/// the write transaction committed.
	pub async fn write_blob(&self, data: &[u8], key: &str, partition: Option<&str>) -> TychoResult<bool> {
		let partition = Partition::normalize(partition);
		let key = key.to_string();
		let data = data.to_vec();

		self.supervisor
			.run(move |pool| async move {
				let mut tx = pool.begin().await.map_err(|e| TychoError::blob_failed("begin blob write transaction", Box::new(e)))?;
				let result = sqlx::query("INSERT OR REPLACE INTO StreamValue (Key, Partition, Data) VALUES (?1, ?2, ?3)")
					.bind(&key)
					.bind(partition.as_str())
					.bind(&data)
					.execute(&mut *tx)
					.await
					.map_err(|e| TychoError::blob_failed("write blob", Box::new(e)))?;

				let ok = result.rows_affected() > 0;
				if ok {
					tx.commit().await.map_err(|e| TychoError::blob_failed("commit blob write", Box::new(e)))?;
				} else {
					tx.rollback().await.map_err(|e| TychoError::blob_failed("rollback failed blob write", Box::new(e)))?;
				}
				Ok(ok)
			})
			.await
	}

	/// Returns the blob's bytes, or `None` if no row exists at `(key, partition)`.
	pub async fn read_blob(&self, key: &str, partition: Option<&str>) -> TychoResult<Option<Vec<u8>>> {
		let partition = Partition::normalize(partition);
		let key = key.to_string();

		self.supervisor
			.run(move |pool| async move {
				let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT Data FROM StreamValue WHERE Key = ?1 AND Partition = ?2")
					.bind(&key)
					.bind(partition.as_str())
					.fetch_optional(&pool)
					.await
					.map_err(|e| TychoError::blob_failed("read blob", Box::new(e)))?;
				Ok(row.map(|(data,)| data))
			})
			.await
	}

	pub async fn exists_blob(&self, key: &str, partition: Option<&str>) -> TychoResult<bool> {
		let partition = Partition::normalize(partition);
		let key = key.to_string();

		let row = self
			.supervisor
			.run(move |pool| async move {
				sqlx::query("SELECT 1 FROM StreamValue WHERE Key = ?1 AND Partition = ?2 LIMIT 1")
					.bind(&key)
					.bind(partition.as_str())
					.fetch_optional(&pool)
					.await
					.map_err(|e| TychoError::blob_failed("exists blob", Box::new(e)))
			})
			.await?;
		Ok(row.is_some())
	}

	/// Returns true iff exactly one blob row was removed.
	pub async fn delete_blob(&self, key: &str, partition: Option<&str>) -> TychoResult<bool> {
		let partition = Partition::normalize(partition);
		let key = key.to_string();

		let affected = self
			.supervisor
			.run(move |pool| async move {
				sqlx::query("DELETE FROM StreamValue WHERE Key = ?1 AND Partition = ?2")
					.bind(&key)
					.bind(partition.as_str())
					.execute(&pool)
					.await
					.map(|r| r.rows_affected())
					.map_err(|e| TychoError::blob_failed("delete blob", Box::new(e)))
			})
			.await?;
		Ok(affected == 1)
	}

	pub async fn delete_blobs(&self, partition: &str) -> TychoResult<u64> {
		let partition = Partition::normalize(Some(partition));
		self.supervisor
			.run(move |pool| async move {
				sqlx::query("DELETE FROM StreamValue WHERE Partition = ?1")
					.bind(partition.as_str())
					.execute(&pool)
					.await
					.map(|r| r.rows_affected())
					.map_err(|e| TychoError::blob_failed("delete blobs by partition", Box::new(e)))
			})
			.await
	}
}
