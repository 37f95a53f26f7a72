//! Application configuration, stored as `seebu.json` in the data directory.

use crate::binding::Region;

use std::path::{Path, PathBuf};

use sb_geocode::DEFAULT_NOMINATIM_URL;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "seebu.json";
pub const DEFAULT_COLLECTION: &str = "goals";

const APP_DIR_NAME: &str = "seebu";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("could not determine the data directory")]
	NoDataDir,
	#[error("config file I/O error: {source}; path: '{}'", .path.display())]
	Io {
		path: Box<Path>,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to (de)serialize config: {0}")]
	Serialization(#[from] serde_json::Error),
	#[error("unknown config version: {0}")]
	UnknownVersion(u32),
	#[error("invalid log directive: {0}")]
	LogDirective(String),
	#[error("failed to install the log subscriber: {0}")]
	LogInit(String),
}

impl ConfigError {
	fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.as_ref().into(),
			source,
		}
	}
}

/// Versioned on-disk schema.
pub trait Migrate {
	fn current_version(&self) -> u32;

	fn target_version() -> u32;

	fn migrate(&mut self) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodingConfig {
	/// Stands in for the device location permission.
	pub enabled: bool,
	pub endpoint: String,
	pub user_agent: String,
}

impl Default for GeocodingConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			endpoint: DEFAULT_NOMINATIM_URL.to_owned(),
			user_agent: concat!("seebu/", env!("CARGO_PKG_VERSION")).to_owned(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
	pub default_region: Region,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeebuConfig {
	/// Config schema version
	pub version: u32,

	pub data_dir: PathBuf,

	/// Default tracing level for the seebu crates
	pub log_level: String,

	/// Store collection holding spot documents
	pub collection: String,

	#[serde(default)]
	pub geocoding: GeocodingConfig,

	#[serde(default)]
	pub map: MapConfig,
}

impl SeebuConfig {
	/// Loads the config from `data_dir`, creating a default one when missing.
	pub async fn load_from(data_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let data_dir = data_dir.as_ref();
		let config_path = data_dir.join(CONFIG_FILE_NAME);

		match fs::read(&config_path).await {
			Ok(bytes) => {
				info!(path = %config_path.display(), "Loading config");
				let mut config = serde_json::from_slice::<Self>(&bytes)?;
				config.data_dir = data_dir.to_path_buf();

				if config.current_version() < Self::target_version() {
					info!(
						from = config.current_version(),
						to = Self::target_version(),
						"Migrating config"
					);
					config.migrate()?;
					config.save().await?;
				} else if config.current_version() > Self::target_version() {
					return Err(ConfigError::UnknownVersion(config.current_version()));
				}

				Ok(config)
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				warn!(path = %config_path.display(), "No config found, creating default");
				let config = Self::default_with_dir(data_dir.to_path_buf());
				config.save().await?;
				Ok(config)
			}
			Err(e) => Err(ConfigError::io(config_path, e)),
		}
	}

	#[must_use]
	pub fn default_with_dir(data_dir: PathBuf) -> Self {
		Self {
			version: Self::target_version(),
			data_dir,
			log_level: "info".to_owned(),
			collection: DEFAULT_COLLECTION.to_owned(),
			geocoding: GeocodingConfig::default(),
			map: MapConfig::default(),
		}
	}

	pub async fn save(&self) -> Result<(), ConfigError> {
		fs::create_dir_all(&self.data_dir)
			.await
			.map_err(|e| ConfigError::io(&self.data_dir, e))?;

		let config_path = self.config_path();
		fs::write(&config_path, serde_json::to_vec_pretty(self)?)
			.await
			.map_err(|e| ConfigError::io(&config_path, e))?;

		info!(path = %config_path.display(), "Saved config");

		Ok(())
	}

	#[must_use]
	pub fn config_path(&self) -> PathBuf {
		self.data_dir.join(CONFIG_FILE_NAME)
	}

	#[must_use]
	pub fn logs_dir(&self) -> PathBuf {
		self.data_dir.join("logs")
	}

	/// Where the in-process backend keeps its documents and accounts.
	#[must_use]
	pub fn backend_path(&self) -> PathBuf {
		self.data_dir.join("backend.json")
	}
}

impl Migrate for SeebuConfig {
	fn current_version(&self) -> u32 {
		self.version
	}

	fn target_version() -> u32 {
		2
	}

	fn migrate(&mut self) -> Result<(), ConfigError> {
		loop {
			match self.version {
				// v1 didn't know about the map section, serde already filled in the default
				0 | 1 => self.version = 2,
				2 => return Ok(()),
				v => return Err(ConfigError::UnknownVersion(v)),
			}
		}
	}
}

pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
	#[cfg(target_os = "linux")]
	let base = dirs::data_local_dir();

	#[cfg(not(target_os = "linux"))]
	let base = dirs::data_dir();

	base.map(|dir| dir.join(APP_DIR_NAME))
		.ok_or(ConfigError::NoDataDir)
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use tempfile::tempdir;
	use tracing_test::traced_test;

	use super::*;

	#[tokio::test]
	#[traced_test]
	async fn creates_default_when_missing() {
		let dir = tempdir().unwrap();

		let config = SeebuConfig::load_from(dir.path()).await.unwrap();
		assert_eq!(config.collection, "goals");
		assert_eq!(config.map.default_region, Region::default());
		assert!(dir.path().join(CONFIG_FILE_NAME).exists());

		let reloaded = SeebuConfig::load_from(dir.path()).await.unwrap();
		assert_eq!(reloaded, config);
	}

	#[tokio::test]
	#[traced_test]
	async fn migrates_old_versions() {
		let dir = tempdir().unwrap();
		fs::write(
			dir.path().join(CONFIG_FILE_NAME),
			serde_json::to_vec(&json!({
				"version": 1,
				"data_dir": "/somewhere/else",
				"log_level": "debug",
				"collection": "spots",
			}))
			.unwrap(),
		)
		.await
		.unwrap();

		let config = SeebuConfig::load_from(dir.path()).await.unwrap();
		assert_eq!(config.version, SeebuConfig::target_version());
		assert_eq!(config.collection, "spots");
		assert_eq!(config.data_dir, dir.path());
		assert!(config.geocoding.enabled);
		assert!(logs_contain("Migrating config"));
	}

	#[tokio::test]
	async fn rejects_newer_versions() {
		let dir = tempdir().unwrap();
		let mut config = SeebuConfig::default_with_dir(dir.path().to_path_buf());
		config.version = 99;
		config.save().await.unwrap();

		assert!(matches!(
			SeebuConfig::load_from(dir.path()).await,
			Err(ConfigError::UnknownVersion(99))
		));
	}
}
