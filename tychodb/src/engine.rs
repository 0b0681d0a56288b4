//! `TychoDb`: the engine handle tying configuration, the Connection
//! Supervisor, the Type Registry and the codec together. Document, Blob,
//! Index and Projection Engine operations are implemented as `impl` blocks on
//! this type in their own modules.

use sqlx::{QueryBuilder, Row};
use tychodb_core::codec::{Codec, JsonCodec};
use tychodb_core::error::{TychoError, TychoResult};
use tychodb_core::registry::TypeRegistry;

use crate::config::TychoConfig;
use crate::supervisor::ConnectionSupervisor;

/// An embedded document store instance, backed by one SQLite file.
///
/// Generic over the [`Codec`] collaborator (`JsonCodec` by default); the
/// codec can't be a trait object (its methods are generic), so callers who
/// need a different serialization scheme supply their own `C` via
/// [`TychoDb::with_codec`].
pub struct TychoDb<C: Codec = JsonCodec> {
	pub(crate) config: TychoConfig,
	pub(crate) supervisor: ConnectionSupervisor,
	pub(crate) registry: TypeRegistry,
	pub(crate) codec: C,
}

impl TychoDb<JsonCodec> {
	/// Builds an engine over the default JSON codec. Does not connect; call
	/// [`TychoDb::connect`] before performing operations.
	pub fn new(config: TychoConfig) -> TychoResult<Self> {
		Self::with_codec(config, JsonCodec)
	}
}

impl<C: Codec> TychoDb<C> {
	pub fn with_codec(config: TychoConfig, codec: C) -> TychoResult<Self> {
		let supervisor = ConnectionSupervisor::new(&config)?;
		Ok(Self { config, supervisor, registry: TypeRegistry::new(), codec })
	}

	pub fn registry(&self) -> &TypeRegistry {
		&self.registry
	}

	pub fn codec(&self) -> &C {
		&self.codec
	}

	pub fn is_connected(&self) -> bool {
		self.supervisor.is_connected()
	}

	/// Opens the single connection and runs the schema bootstrap. Idempotent.
	pub async fn connect(&self) -> TychoResult<()> {
		self.supervisor.connect().await
	}

	pub async fn disconnect(&self) {
		self.supervisor.disconnect().await;
	}

	/// Distinct partitions in use, optionally scoped to a single registered
	/// type's `FullTypeName`. Named in the Query Catalog's responsibilities
	/// (spec §4.5) but never exposed as its own Document Engine operation in
	/// the original component list; added here since nothing else in the
	/// public surface lets a caller enumerate partitions.
	pub async fn list_partitions(&self, full_type_name: Option<&str>) -> TychoResult<Vec<String>> {
		let scope = full_type_name.map(str::to_owned);
		self.supervisor
			.run(move |pool| async move {
				let mut qb = QueryBuilder::new("SELECT DISTINCT Partition FROM JsonValue");
				if let Some(name) = &scope {
					qb.push(" WHERE FullTypeName = ");
					qb.push_bind(name.clone());
				}
				let rows = qb
					.build()
					.fetch_all(&pool)
					.await
					.map_err(|e| TychoError::read_failed("list partitions", Box::new(e)))?;
				rows.into_iter()
					.map(|row| row.try_get::<String, _>(0).map_err(|e| TychoError::read_failed("decode partition", Box::new(e))))
					.collect()
			})
			.await
	}
}
