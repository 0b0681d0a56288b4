//! Document Engine (spec §4.7, C7): write / read / count / exist / delete for
//! typed JSON documents.

use futures::TryStreamExt;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{QueryBuilder, Row};
use tokio_util::sync::CancellationToken;
use tychodb_core::codec::Codec;
use tychodb_core::error::{TychoError, TychoResult};
use tychodb_core::filter::Filter;
use tychodb_core::key::{Key, Partition};
use tychodb_core::registry::IdValue;
use tychodb_core::sort::Sort;

use crate::engine::TychoDb;
use crate::{filter_sql, sort_sql};

/// Writes reuse one prepared statement across windows of this many rows
/// (spec §4.7, §9 "prepared-statement reuse").
const BATCH_WINDOW: usize = 100;

impl<C: Codec> TychoDb<C> {
	/// Serializes `obj` and inserts-or-replaces it, keyed by `key_selector`
	/// when given, otherwise by the registered id-selector for `T`. Returns
	/// whether the row was written.
	pub async fn write<T>(
		&self,
		obj: &T,
		key_selector: Option<&(dyn Fn(&T) -> IdValue + Send + Sync)>,
		partition: Option<&str>,
	) -> TychoResult<bool>
	where
		T: Serialize + Send + Sync + 'static,
	{
		self.write_many(std::slice::from_ref(obj), key_selector, partition, None).await
	}

	/// Batched form of [`TychoDb::write`]. Streams through a single
	/// prepared statement in windows of [`BATCH_WINDOW`] rows inside one
	/// transaction, checking `cancellation` between windows; commits only if
	/// every row was written, otherwise rolls back.
	pub async fn write_many<T>(
		&self,
		objs: &[T],
		key_selector: Option<&(dyn Fn(&T) -> IdValue + Send + Sync)>,
		partition: Option<&str>,
		cancellation: Option<&CancellationToken>,
	) -> TychoResult<bool>
	where
		T: Serialize + Send + Sync + 'static,
	{
		if objs.is_empty() {
			return Ok(true);
		}
		let full_type_name = self.registry.resolve_full_type_name::<T>(self.config.require_type_registration())?;
		let partition = Partition::normalize(partition);

		let mut rows = Vec::with_capacity(objs.len());
		for obj in objs {
			let id = match key_selector {
				Some(selector) => selector(obj),
				None => self.registry.id_for(obj)?,
			};
			let key = Key::new(id.as_storage_string());
			let bytes = self.codec.serialize(obj)?;
			let json_text =
				String::from_utf8(bytes).map_err(|e| TychoError::write_failed("encode document as utf-8 JSON", Box::new(e)))?;
			rows.push((key, json_text));
		}
		let cancellation = cancellation.cloned();

		self.supervisor
			.run(move |pool| async move {
				let mut tx = pool.begin().await.map_err(|e| TychoError::write_failed("begin write transaction", Box::new(e)))?;
				let mut all_ok = true;
				for (window_index, window) in rows.chunks(BATCH_WINDOW).enumerate() {
					let cancelled = window_index > 0 && cancellation.as_ref().is_some_and(CancellationToken::is_cancelled);
					if cancelled {
						tx.rollback().await.map_err(|e| TychoError::write_failed("rollback on cancellation", Box::new(e)))?;
						return Err(TychoError::Cancelled);
					}
					for (key, json_text) in window {
						let result = sqlx::query(
							"INSERT OR REPLACE INTO JsonValue (Key, FullTypeName, Partition, Data) VALUES (?1, ?2, ?3, json(?4))",
						)
						.bind(key.as_str())
						.bind(&*full_type_name)
						.bind(partition.as_str())
						.bind(json_text)
						.execute(&mut *tx)
						.await
						.map_err(|e| TychoError::write_failed("insert document", Box::new(e)))?;
						all_ok &= result.rows_affected() > 0;
					}
				}
				if all_ok {
					tx.commit().await.map_err(|e| TychoError::write_failed("commit write transaction", Box::new(e)))?;
				} else {
					tx.rollback().await.map_err(|e| TychoError::write_failed("rollback incomplete write", Box::new(e)))?;
				}
				Ok(all_ok)
			})
			.await
	}

	pub async fn read_by_key<T>(&self, key: &str, partition: Option<&str>) -> TychoResult<Option<T>>
	where
		T: DeserializeOwned + Send + Sync + 'static,
	{
		let full_type_name = self.registry.resolve_full_type_name::<T>(self.config.require_type_registration())?;
		let partition = Partition::normalize(partition);
		let key = key.to_string();

		let row = self
			.supervisor
			.run(move |pool| async move {
				sqlx::query("SELECT Data FROM JsonValue WHERE Key = ?1 AND FullTypeName = ?2 AND Partition = ?3")
					.bind(&key)
					.bind(&*full_type_name)
					.bind(partition.as_str())
					.fetch_optional(&pool)
					.await
					.map_err(|e| TychoError::read_failed("read by key", Box::new(e)))
			})
			.await?;

		self.decode_optional_row(row).await
	}

	/// Fetches up to one matching row; fails with `AmbiguousMatch` if more
	/// than one row satisfies `filter` (spec §4.7: implemented as a
	/// count-then-fetch-with-limit pair).
	pub async fn read_by_filter<T>(&self, filter: &Filter, partition: Option<&str>) -> TychoResult<Option<T>>
	where
		T: DeserializeOwned + Send + Sync + 'static,
	{
		let full_type_name = self.registry.resolve_full_type_name::<T>(self.config.require_type_registration())?;
		let partition = Partition::normalize(partition);

		let rows = self
			.supervisor
			.run(|pool| async move {
				let mut qb = QueryBuilder::new("SELECT Data FROM JsonValue WHERE 1=1 AND FullTypeName = ");
				qb.push_bind(full_type_name.to_string());
				qb.push(" AND Partition = ");
				qb.push_bind(partition.as_str().to_string());
				filter_sql::render_where(&mut qb, filter, &self.codec)?;
				qb.push(" LIMIT 2");
				qb.build().fetch_all(&pool).await.map_err(|e| TychoError::read_failed("read by filter", Box::new(e)))
			})
			.await?;

		if rows.len() > 1 {
			return Err(TychoError::AmbiguousMatch);
		}
		self.decode_optional_row(rows.into_iter().next()).await
	}

	/// Fetches the first row matching `filter` and ordered by `sort`; never
	/// fails on more than one match.
	pub async fn read_first<T>(&self, filter: Option<&Filter>, sort: Option<&Sort>, partition: Option<&str>) -> TychoResult<Option<T>>
	where
		T: DeserializeOwned + Send + Sync + 'static,
	{
		let full_type_name = self.registry.resolve_full_type_name::<T>(self.config.require_type_registration())?;
		let partition = Partition::normalize(partition);

		let row = self
			.supervisor
			.run(|pool| async move {
				let mut qb = QueryBuilder::new("SELECT Data FROM JsonValue WHERE 1=1 AND FullTypeName = ");
				qb.push_bind(full_type_name.to_string());
				qb.push(" AND Partition = ");
				qb.push_bind(partition.as_str().to_string());
				if let Some(filter) = filter {
					filter_sql::render_where(&mut qb, filter, &self.codec)?;
				}
				if let Some(sort) = sort {
					sort_sql::render_order_by(&mut qb, sort);
				}
				qb.push(" LIMIT 1");
				qb.build().fetch_optional(&pool).await.map_err(|e| TychoError::read_failed("read first", Box::new(e)))
			})
			.await?;

		self.decode_optional_row(row).await
	}

	/// Streams matching rows with sequential-access behavior: each row's
	/// `Data` is copied into an owned buffer before the cursor advances, so
	/// deserialization never holds a cursor open across an `await` (spec
	/// §4.7). Pre-sizes the result by `top` when given; reports fractional
	/// progress per row via `progress`. Checks `cancellation` once per row,
	/// failing with `TychoError::Cancelled` the moment it observes a
	/// cancelled token (spec §4.6/§5: honored between rows inside long
	/// reads).
	pub async fn read_many<T>(
		&self,
		partition: Option<&str>,
		filter: Option<&Filter>,
		sort: Option<&Sort>,
		top: Option<usize>,
		progress: Option<&(dyn Fn(f64) + Send + Sync)>,
		cancellation: Option<&CancellationToken>,
	) -> TychoResult<Vec<T>>
	where
		T: DeserializeOwned + Send + Sync + 'static,
	{
		let full_type_name = self.registry.resolve_full_type_name::<T>(self.config.require_type_registration())?;
		let partition = Partition::normalize(partition);
		let cancellation = cancellation.cloned();

		let raw_rows: Vec<String> = self
			.supervisor
			.run(|pool| async move {
				let mut qb = QueryBuilder::new("SELECT Data FROM JsonValue WHERE 1=1 AND FullTypeName = ");
				qb.push_bind(full_type_name.to_string());
				qb.push(" AND Partition = ");
				qb.push_bind(partition.as_str().to_string());
				if let Some(filter) = filter {
					filter_sql::render_where(&mut qb, filter, &self.codec)?;
				}
				if let Some(sort) = sort {
					sort_sql::render_order_by(&mut qb, sort);
				}
				if let Some(top) = top {
					qb.push(" LIMIT ");
					qb.push_bind(top as i64);
				}

				let mut buffer = Vec::with_capacity(top.unwrap_or(0));
				let mut stream = qb.build().fetch(&pool);
				while let Some(row) = stream.try_next().await.map_err(|e| TychoError::read_failed("stream rows", Box::new(e)))? {
					if cancellation.as_ref().is_some_and(CancellationToken::is_cancelled) {
						return Err(TychoError::Cancelled);
					}
					let data: String = row.try_get("Data").map_err(|e| TychoError::read_failed("decode Data column", Box::new(e)))?;
					buffer.push(data);
				}
				Ok(buffer)
			})
			.await?;

		let total = raw_rows.len().max(1);
		let mut out = Vec::with_capacity(raw_rows.len());
		for (i, data) in raw_rows.into_iter().enumerate() {
			out.push(self.codec.deserialize_async(data.into_bytes()).await?);
			if let Some(progress) = progress {
				progress((i + 1) as f64 / total as f64);
			}
		}
		Ok(out)
	}

	/// Executes the same select `read_many` would and counts the returned
	/// rows — not `COUNT(*)`, so any filter applies identically to both
	/// operations (spec §4.7, §8 `count == length(read_many)`).
	pub async fn count<T>(&self, partition: Option<&str>, filter: Option<&Filter>) -> TychoResult<usize>
	where
		T: Send + Sync + 'static,
	{
		let full_type_name = self.registry.resolve_full_type_name::<T>(self.config.require_type_registration())?;
		let partition = Partition::normalize(partition);

		self.supervisor
			.run(|pool| async move {
				let mut qb = QueryBuilder::new("SELECT 1 FROM JsonValue WHERE 1=1 AND FullTypeName = ");
				qb.push_bind(full_type_name.to_string());
				qb.push(" AND Partition = ");
				qb.push_bind(partition.as_str().to_string());
				if let Some(filter) = filter {
					filter_sql::render_where(&mut qb, filter, &self.codec)?;
				}
				let rows = qb.build().fetch_all(&pool).await.map_err(|e| TychoError::read_failed("count", Box::new(e)))?;
				Ok(rows.len())
			})
			.await
	}

	pub async fn exists_by_key<T>(&self, key: &str, partition: Option<&str>) -> TychoResult<bool>
	where
		T: Send + Sync + 'static,
	{
		let full_type_name = self.registry.resolve_full_type_name::<T>(self.config.require_type_registration())?;
		let partition = Partition::normalize(partition);
		let key = key.to_string();

		let row = self
			.supervisor
			.run(move |pool| async move {
				sqlx::query("SELECT 1 FROM JsonValue WHERE Key = ?1 AND FullTypeName = ?2 AND Partition = ?3 LIMIT 1")
					.bind(&key)
					.bind(&*full_type_name)
					.bind(partition.as_str())
					.fetch_optional(&pool)
					.await
					.map_err(|e| TychoError::read_failed("exists by key", Box::new(e)))
			})
			.await?;
		Ok(row.is_some())
	}

	/// Returns true iff exactly one row was removed.
	pub async fn delete_by_key<T>(&self, key: &str, partition: Option<&str>) -> TychoResult<bool>
	where
		T: Send + Sync + 'static,
	{
		let full_type_name = self.registry.resolve_full_type_name::<T>(self.config.require_type_registration())?;
		let partition = Partition::normalize(partition);
		let key = key.to_string();

		let affected = self
			.supervisor
			.run(move |pool| async move {
				sqlx::query("DELETE FROM JsonValue WHERE Key = ?1 AND FullTypeName = ?2 AND Partition = ?3")
					.bind(&key)
					.bind(&*full_type_name)
					.bind(partition.as_str())
					.execute(&pool)
					.await
					.map(|r| r.rows_affected())
					.map_err(|e| TychoError::delete_failed("delete by key", Box::new(e)))
			})
			.await?;
		Ok(affected == 1)
	}

	pub async fn delete_many<T>(&self, partition: Option<&str>, filter: Option<&Filter>) -> TychoResult<u64>
	where
		T: Send + Sync + 'static,
	{
		let full_type_name = self.registry.resolve_full_type_name::<T>(self.config.require_type_registration())?;
		let partition = Partition::normalize(partition);

		self.supervisor
			.run(|pool| async move {
				let mut qb = QueryBuilder::new("DELETE FROM JsonValue WHERE 1=1 AND FullTypeName = ");
				qb.push_bind(full_type_name.to_string());
				qb.push(" AND Partition = ");
				qb.push_bind(partition.as_str().to_string());
				if let Some(filter) = filter {
					filter_sql::render_where(&mut qb, filter, &self.codec)?;
				}
				qb.build().execute(&pool).await.map(|r| r.rows_affected()).map_err(|e| TychoError::delete_failed("delete many", Box::new(e)))
			})
			.await
	}

	/// Removes all documents in `partition`, across every registered type.
	pub async fn delete_by_partition(&self, partition: &str) -> TychoResult<u64> {
		let partition = Partition::normalize(Some(partition));
		self.supervisor
			.run(move |pool| async move {
				sqlx::query("DELETE FROM JsonValue WHERE Partition = ?1")
					.bind(partition.as_str())
					.execute(&pool)
					.await
					.map(|r| r.rows_affected())
					.map_err(|e| TychoError::delete_failed("delete by partition", Box::new(e)))
			})
			.await
	}

	/// Truncates the document table entirely: no partition, no type filter.
	pub async fn delete_all(&self) -> TychoResult<u64> {
		self.supervisor
			.run(|pool| async move {
				sqlx::query("DELETE FROM JsonValue")
					.execute(&pool)
					.await
					.map(|r| r.rows_affected())
					.map_err(|e| TychoError::delete_failed("delete all", Box::new(e)))
			})
			.await
	}

	async fn decode_optional_row<T>(&self, row: Option<sqlx::sqlite::SqliteRow>) -> TychoResult<Option<T>>
	where
		T: DeserializeOwned,
	{
		match row {
			Some(row) => {
				let data: String = row.try_get("Data").map_err(|e| TychoError::read_failed("decode Data column", Box::new(e)))?;
				Ok(Some(self.codec.deserialize_async(data.into_bytes()).await?))
			}
			None => Ok(None),
		}
	}
}
