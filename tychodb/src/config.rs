//! Engine configuration (spec §6's configuration table), built the way the
//! teacher's `ServerBuilder` composes a server: chained `&mut self -> &mut Self`
//! setters over a plain data struct, consumed by [`crate::TychoDb::connect`].

use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DB_NAME: &str = "tycho_cache.db";
const DEFAULT_COMMAND_TIMEOUT_SECONDS: u64 = 30;

/// Engine configuration. Construct with [`TychoConfig::new`] and chain
/// setters, or use [`TychoConfigBuilder`] directly.
#[derive(Debug, Clone)]
pub struct TychoConfig {
	pub(crate) db_path: PathBuf,
	pub(crate) db_name: String,
	pub(crate) password: Option<String>,
	pub(crate) persist_connection: bool,
	pub(crate) rebuild_cache: bool,
	pub(crate) require_type_registration: bool,
	pub(crate) use_connection_pooling: bool,
	pub(crate) command_timeout: Duration,
}

impl TychoConfig {
	/// Starts a builder rooted at `db_path`, with every other option at its
	/// spec-mandated default.
	#[allow(clippy::new_ret_no_self)]
	pub fn new(db_path: impl AsRef<Path>) -> TychoConfigBuilder {
		TychoConfigBuilder {
			config: Self {
				db_path: db_path.as_ref().to_path_buf(),
				db_name: DEFAULT_DB_NAME.to_string(),
				password: None,
				persist_connection: true,
				rebuild_cache: false,
				require_type_registration: false,
				use_connection_pooling: true,
				command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECONDS),
			},
		}
	}

	pub(crate) fn db_file(&self) -> PathBuf {
		self.db_path.join(&self.db_name)
	}

	pub fn persist_connection(&self) -> bool {
		self.persist_connection
	}

	pub fn require_type_registration(&self) -> bool {
		self.require_type_registration
	}

	pub fn command_timeout(&self) -> Duration {
		self.command_timeout
	}

	pub fn use_connection_pooling(&self) -> bool {
		self.use_connection_pooling
	}
}

/// Builder for [`TychoConfig`].
#[derive(Debug, Clone)]
pub struct TychoConfigBuilder {
	config: TychoConfig,
}

impl TychoConfigBuilder {
	pub fn db_name(&mut self, db_name: impl Into<String>) -> &mut Self {
		self.config.db_name = db_name.into();
		self
	}

	pub fn password(&mut self, password: impl Into<String>) -> &mut Self {
		self.config.password = Some(password.into());
		self
	}

	pub fn persist_connection(&mut self, persist: bool) -> &mut Self {
		self.config.persist_connection = persist;
		self
	}

	pub fn rebuild_cache(&mut self, rebuild: bool) -> &mut Self {
		self.config.rebuild_cache = rebuild;
		self
	}

	pub fn require_type_registration(&mut self, require: bool) -> &mut Self {
		self.config.require_type_registration = require;
		self
	}

	pub fn use_connection_pooling(&mut self, enabled: bool) -> &mut Self {
		self.config.use_connection_pooling = enabled;
		self
	}

	pub fn command_timeout_seconds(&mut self, seconds: u64) -> &mut Self {
		self.config.command_timeout = Duration::from_secs(seconds);
		self
	}

	pub fn build(&self) -> TychoConfig {
		self.config.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_configuration_table() {
		let cfg = TychoConfig::new("/tmp/wherever").build();
		assert_eq!(cfg.db_name, DEFAULT_DB_NAME);
		assert!(cfg.persist_connection);
		assert!(!cfg.rebuild_cache);
		assert!(!cfg.require_type_registration);
		assert!(cfg.use_connection_pooling);
		assert_eq!(cfg.command_timeout, Duration::from_secs(30));
	}

	#[test]
	fn builder_chains_overrides() {
		let cfg = TychoConfig::new("/tmp/wherever")
			.db_name("custom.db")
			.persist_connection(false)
			.require_type_registration(true)
			.command_timeout_seconds(5)
			.build();
		assert_eq!(cfg.db_name, "custom.db");
		assert!(!cfg.persist_connection);
		assert!(cfg.require_type_registration);
		assert_eq!(cfg.command_timeout, Duration::from_secs(5));
	}
}
