use serde::Deserialize;

pub const DEFAULT_DAEMON_HOST: &str = "127.0.0.1";
pub const DEFAULT_DAEMON_PORT: u16 = 3381;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub service: Service,
	pub daemon: Daemon,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	/// `tracing_subscriber::EnvFilter` directive, e.g. "info" or "riddle_query=debug".
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

/// Where the search daemon listens.
///
/// The connect timeout is handed to the daemon client untouched; nothing in the query core
/// enforces it.
#[derive(Debug, Clone, Deserialize)]
pub struct Daemon {
	#[serde(default = "default_daemon_host")]
	pub host: String,
	#[serde(default = "default_daemon_port")]
	pub port: u16,
	#[serde(default)]
	pub connect_timeout_ms: Option<u64>,
}
impl Default for Daemon {
	fn default() -> Self {
		Self { host: default_daemon_host(), port: default_daemon_port(), connect_timeout_ms: None }
	}
}

fn default_daemon_host() -> String {
	DEFAULT_DAEMON_HOST.to_string()
}

fn default_daemon_port() -> u16 {
	DEFAULT_DAEMON_PORT
}
