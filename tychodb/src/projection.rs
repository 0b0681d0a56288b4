//! Projection Engine (spec §4.10, C10): extract subtrees/fields from
//! documents into `TOut` with or without keys. Composes with filter, sort
//! and partition scoping exactly like `read_many` — it only changes what's
//! selected, not how rows are matched or ordered.

use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use sqlx::{QueryBuilder, Row};
use tychodb_core::codec::Codec;
use tychodb_core::error::{TychoError, TychoResult};
use tychodb_core::filter::Filter;
use tychodb_core::key::Partition;
use tychodb_core::path::FieldPath;
use tychodb_core::sort::Sort;

use crate::engine::TychoDb;
use crate::{filter_sql, sort_sql};

impl<C: Codec> TychoDb<C> {
	/// Selects `JSON_EXTRACT(Data, inner_path)` for every `TIn` row matching
	/// the scoping arguments, deserializing each extracted subtree as `TOut`.
	pub async fn read_projected<TIn, TOut>(
		&self,
		inner_path: &FieldPath,
		partition: Option<&str>,
		filter: Option<&Filter>,
		sort: Option<&Sort>,
		top: Option<usize>,
	) -> TychoResult<Vec<TOut>>
	where
		TIn: 'static,
		TOut: DeserializeOwned + Send + Sync + 'static,
	{
		let with_keys = self.read_projected_with_keys::<TIn, TOut>(inner_path, partition, filter, sort, top).await?;
		Ok(with_keys.into_iter().map(|(_, value)| value).collect())
	}

	/// As [`TychoDb::read_projected`], additionally selecting `Key` and
	/// returning `(key, inner_object)` pairs.
	pub async fn read_projected_with_keys<TIn, TOut>(
		&self,
		inner_path: &FieldPath,
		partition: Option<&str>,
		filter: Option<&Filter>,
		sort: Option<&Sort>,
		top: Option<usize>,
	) -> TychoResult<Vec<(String, TOut)>>
	where
		TIn: 'static,
		TOut: DeserializeOwned + Send + Sync + 'static,
	{
		let full_type_name = self.registry.resolve_full_type_name::<TIn>(self.config.require_type_registration())?;
		let partition = Partition::normalize(partition);
		let inner_path = inner_path.as_str().to_string();

		let raw_rows: Vec<(String, String)> = self
			.supervisor
			.run(|pool| async move {
				// json_extract alone returns a native SQL type (INTEGER/REAL) for
			// scalar members, which sqlx can't decode as TEXT. Wrapping in
			// json_object guarantees a TEXT column regardless of the
			// extracted value's JSON type; the wrapper is unpacked below.
			let mut qb = QueryBuilder::new("SELECT Key, JSON_OBJECT('v', JSON_EXTRACT(Data, ");
				qb.push_bind(inner_path);
				qb.push(")) AS Projected FROM JsonValue WHERE 1=1 AND FullTypeName = ");
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
				while let Some(row) = stream.try_next().await.map_err(|e| TychoError::read_failed("stream projected rows", Box::new(e)))? {
					let key: String = row.try_get("Key").map_err(|e| TychoError::read_failed("decode Key column", Box::new(e)))?;
					let projected: String =
						row.try_get("Projected").map_err(|e| TychoError::read_failed("decode Projected column", Box::new(e)))?;
					buffer.push((key, projected));
				}
				Ok(buffer)
			})
			.await?;

		let mut out = Vec::with_capacity(raw_rows.len());
		for (key, wrapped) in raw_rows {
			let wrapper: serde_json::Value =
				serde_json::from_str(&wrapped).map_err(|e| TychoError::read_failed("unwrap projected value", Box::new(e)))?;
			let inner = wrapper.get("v").cloned().unwrap_or(serde_json::Value::Null);
			let bytes = serde_json::to_vec(&inner).map_err(|e| TychoError::read_failed("re-encode projected value", Box::new(e)))?;
			out.push((key, self.codec.deserialize_async(bytes).await?));
		}
		Ok(out)
	}
}
