//! Error handling subsystem. Kind-discriminated error with an optional inner cause.

/// Result alias used throughout the crate.
pub type TychoResult<T> = std::result::Result<T, TychoError>;

/// Boxed cause from whatever storage engine is backing the crate. Keeps this
/// crate decoupled from a specific storage driver (spec §1: the storage engine
/// is an external collaborator, interface only).
pub type StorageCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All failure kinds a TychoDB operation can produce (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum TychoError {
	/// Operation invoked before `connect()`.
	#[error("not connected: call connect() before performing operations")]
	NotConnected,

	/// Strict mode (`require_type_registration=true`) and the type has no registration.
	#[error("type `{0}` is not registered")]
	NotRegistered(String),

	/// `register_by_convention` produced no id-selector and a call relied on one.
	#[error("type `{0}` has no id-selector (register_by_convention found none)")]
	MissingIdSelector(String),

	/// Accessor expression was not a chain of public member accesses.
	#[error("invalid path expression: {0}")]
	InvalidPath(String),

	/// `read_by_filter` matched more than one row.
	#[error("filter matched more than one row, expected at most one")]
	AmbiguousMatch,

	/// Storage engine lacks JSON1-equivalent support.
	#[error("storage engine does not support JSON (need SQLite >= 3.38 or JSON1 compile option)")]
	JsonUnsupported,

	/// Write failed; wraps the storage-engine cause.
	#[error("failed writing objects: {message}")]
	WriteFailed {
		message: String,
		#[source]
		source: Option<StorageCause>,
	},

	/// Read failed; wraps the storage-engine cause.
	#[error("failed reading objects: {message}")]
	ReadFailed {
		message: String,
		#[source]
		source: Option<StorageCause>,
	},

	/// Delete failed; wraps the storage-engine cause.
	#[error("failed deleting objects: {message}")]
	DeleteFailed {
		message: String,
		#[source]
		source: Option<StorageCause>,
	},

	/// Index creation failed; wraps the storage-engine cause.
	#[error("failed creating index: {message}")]
	IndexFailed {
		message: String,
		#[source]
		source: Option<StorageCause>,
	},

	/// Blob operation failed; wraps the storage-engine cause.
	#[error("failed on blob operation: {message}")]
	BlobFailed {
		message: String,
		#[source]
		source: Option<StorageCause>,
	},

	/// Operation aborted via a cancellation token.
	#[error("operation cancelled")]
	Cancelled,

	/// Underlying I/O failure (e.g. rebuilding the cache file).
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	/// The codec failed to serialize or deserialize a value.
	#[error("codec error: {0}")]
	Codec(#[from] serde_json::Error),
}

impl TychoError {
	/// Logs `source` at `warn!` and wraps it as `WriteFailed`. Mirrors the teacher's
	/// `inspect()` helper in `meta-adapter-sqlite/src/lib.rs`: nothing is swallowed silently.
	pub fn write_failed(message: impl Into<String>, source: StorageCause) -> Self {
		tracing::warn!(error = %source, "storage write failed");
		Self::WriteFailed { message: message.into(), source: Some(source) }
	}

	pub fn read_failed(message: impl Into<String>, source: StorageCause) -> Self {
		tracing::warn!(error = %source, "storage read failed");
		Self::ReadFailed { message: message.into(), source: Some(source) }
	}

	pub fn delete_failed(message: impl Into<String>, source: StorageCause) -> Self {
		tracing::warn!(error = %source, "storage delete failed");
		Self::DeleteFailed { message: message.into(), source: Some(source) }
	}

	pub fn index_failed(message: impl Into<String>, source: StorageCause) -> Self {
		tracing::warn!(error = %source, "index creation failed");
		Self::IndexFailed { message: message.into(), source: Some(source) }
	}

	pub fn blob_failed(message: impl Into<String>, source: StorageCause) -> Self {
		tracing::warn!(error = %source, "blob operation failed");
		Self::BlobFailed { message: message.into(), source: Some(source) }
	}
}
