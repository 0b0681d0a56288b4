//! Connection Supervisor (spec §4.6, §5, C6): single-writer serialization via
//! a fair FIFO permit, connection lifecycle, and the persist-vs-per-operation
//! open policy. Grounded in the teacher's `SqliteConnectOptions`/`SqlitePoolOptions`
//! setup in `meta-adapter-sqlite/src/lib.rs`, generalized from a fixed
//! writer/reader pool pair into an explicit permit every operation passes
//! through — the spec asks for single-threaded cooperative access, not just
//! single-writer access, so reads serialize through the same permit as writes.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::{Mutex, Semaphore};
use tychodb_core::error::{TychoError, TychoResult};

use crate::config::TychoConfig;
use crate::schema;

/// Serializes every Document/Blob/Index/Projection Engine call behind a
/// capacity-1 FIFO permit (`tokio::sync::Semaphore` queues acquirers in
/// arrival order) and owns the connect/disconnect lifecycle.
pub(crate) struct ConnectionSupervisor {
	connect_options: SqliteConnectOptions,
	persist_connection: bool,
	use_connection_pooling: bool,
	command_timeout: Duration,
	connected: AtomicBool,
	permit: Semaphore,
	persistent_pool: Mutex<Option<SqlitePool>>,
}

impl ConnectionSupervisor {
	pub(crate) fn new(config: &TychoConfig) -> TychoResult<Self> {
		if config.rebuild_cache {
			remove_cache_file(config)?;
		}

		let mut options = SqliteConnectOptions::new()
			.filename(config.db_file())
			.create_if_missing(true)
			.journal_mode(SqliteJournalMode::Wal);
		if let Some(password) = &config.password {
			options = options.pragma("key", password.clone());
		}

		Ok(Self {
			connect_options: options,
			persist_connection: config.persist_connection(),
			use_connection_pooling: config.use_connection_pooling(),
			command_timeout: config.command_timeout(),
			connected: AtomicBool::new(false),
			permit: Semaphore::new(1),
			persistent_pool: Mutex::new(None),
		})
	}

	pub(crate) fn is_connected(&self) -> bool {
		self.connected.load(Ordering::Acquire)
	}

	/// Opens exactly one connection and runs the schema bootstrap. Idempotent:
	/// a second call is a no-op (spec §4.6).
	pub(crate) async fn connect(&self) -> TychoResult<()> {
		if self.is_connected() {
			return Ok(());
		}
		tracing::info!("connecting to storage engine");
		let pool = open_pool(&self.connect_options, self.use_connection_pooling).await?;
		schema::bootstrap(&pool).await?;

		if self.persist_connection {
			*self.persistent_pool.lock().await = Some(pool);
		} else {
			pool.close().await;
		}
		self.connected.store(true, Ordering::Release);
		Ok(())
	}

	pub(crate) async fn disconnect(&self) {
		let mut guard = self.persistent_pool.lock().await;
		if let Some(pool) = guard.take() {
			pool.close().await;
		}
		self.connected.store(false, Ordering::Release);
		tracing::info!("disconnected");
	}

	/// Acquires the permit, obtains a pool handle (the persistent one, or a
	/// freshly opened one that closes again at the end of the window), runs
	/// `op`, and releases both. Every Document/Blob/Index/Projection Engine
	/// operation funnels through here.
	pub(crate) async fn run<T, F, Fut>(&self, op: F) -> TychoResult<T>
	where
		F: FnOnce(SqlitePool) -> Fut,
		Fut: Future<Output = TychoResult<T>>,
	{
		if !self.is_connected() {
			return Err(TychoError::NotConnected);
		}

		let _permit = self.permit.acquire().await.map_err(|_| TychoError::Cancelled)?;
		tracing::debug!("permit acquired");

		let run_op = async {
			if self.persist_connection {
				let guard = self.persistent_pool.lock().await;
				let pool = guard.as_ref().ok_or(TychoError::NotConnected)?.clone();
				drop(guard);
				op(pool).await
			} else {
				let pool = open_pool(&self.connect_options, self.use_connection_pooling).await?;
				let result = op(pool.clone()).await;
				pool.close().await;
				result
			}
		};

		let result = match tokio::time::timeout(self.command_timeout, run_op).await {
			Ok(result) => result,
			Err(_) => Err(TychoError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "command timed out"))),
		};

		tracing::debug!("permit released");
		result
	}
}

/// Opens a pool against `options`. When `use_connection_pooling` is false,
/// the pool is kept to a single connection with no idle retention — every
/// acquire opens a fresh connection rather than reusing a pooled one (spec
/// §6: "pass through to the storage engine").
async fn open_pool(options: &SqliteConnectOptions, use_connection_pooling: bool) -> TychoResult<SqlitePool> {
	let mut pool_options = SqlitePoolOptions::new().max_connections(1);
	if !use_connection_pooling {
		pool_options = pool_options.min_connections(0).idle_timeout(Some(Duration::from_secs(0)));
	}
	pool_options
		.connect_with(options.clone())
		.await
		.map_err(|e| TychoError::write_failed("open storage engine connection", Box::new(e)))
}

fn remove_cache_file(config: &TychoConfig) -> TychoResult<()> {
	let db_file = config.db_file();
	for candidate in [db_file.clone(), append_suffix(&db_file, "-wal"), append_suffix(&db_file, "-shm")] {
		if candidate.exists() {
			std::fs::remove_file(&candidate)?;
		}
	}
	tracing::info!(path = %db_file.display(), "rebuilt cache: removed existing database file");
	Ok(())
}

fn append_suffix(path: &std::path::Path, suffix: &str) -> std::path::PathBuf {
	let mut name = path.as_os_str().to_owned();
	name.push(suffix);
	std::path::PathBuf::from(name)
}
