mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, DEFAULT_DAEMON_HOST, DEFAULT_DAEMON_PORT, Daemon, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.daemon.host.is_empty() {
		return Err(Error::Validation { message: "daemon.host must be non-empty.".to_string() });
	}
	if cfg.daemon.port == 0 {
		return Err(Error::Validation {
			message: "daemon.port must be greater than zero.".to_string(),
		});
	}

	if let Some(timeout) = cfg.daemon.connect_timeout_ms
		&& timeout == 0
	{
		return Err(Error::Validation {
			message: "daemon.connect_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let host = cfg.daemon.host.trim();

	if host.len() != cfg.daemon.host.len() {
		cfg.daemon.host = host.to_string();
	}
}
