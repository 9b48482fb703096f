use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use riddle_config::{Config, DEFAULT_DAEMON_HOST, DEFAULT_DAEMON_PORT, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with_daemon(host: &str, port: i64) -> String {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let root = value.as_table_mut().expect("Template config must be a table.");
	let daemon = root
		.get_mut("daemon")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [daemon].");

	daemon.insert("host".to_string(), Value::String(host.to_string()));
	daemon.insert("port".to_string(), Value::Integer(port));

	toml::to_string(&value).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("riddle_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

#[test]
fn template_config_loads() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML.to_string());
	let result = riddle_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected template config to load.");

	assert_eq!(cfg.service.log_level, "info");
	assert_eq!(cfg.daemon.port, 3381);
	assert_eq!(cfg.daemon.connect_timeout_ms, Some(1_000));
}

#[test]
fn empty_config_falls_back_to_daemon_defaults() {
	let path = write_temp_config(String::new());
	let result = riddle_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected empty config to load.");

	assert_eq!(cfg.daemon.host, DEFAULT_DAEMON_HOST);
	assert_eq!(cfg.daemon.port, DEFAULT_DAEMON_PORT);
	assert_eq!(cfg.daemon.connect_timeout_ms, None);
	assert_eq!(cfg.service.log_level, "info");
}

#[test]
fn daemon_host_is_trimmed() {
	let path = write_temp_config(sample_toml_with_daemon("  search.internal  ", 9312));
	let result = riddle_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected config to load.");

	assert_eq!(cfg.daemon.host, "search.internal");
	assert_eq!(cfg.daemon.port, 9312);
}

#[test]
fn blank_daemon_host_is_rejected() {
	let path = write_temp_config(sample_toml_with_daemon("   ", 9312));
	let result = riddle_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected daemon.host validation error.");

	assert!(
		err.to_string().contains("daemon.host must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn daemon_port_must_be_positive() {
	let mut cfg = base_config();

	cfg.daemon.port = 0;

	let err = riddle_config::validate(&cfg).expect_err("Expected daemon.port validation error.");

	assert!(
		err.to_string().contains("daemon.port must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn connect_timeout_must_be_positive_when_set() {
	let mut cfg = base_config();

	cfg.daemon.connect_timeout_ms = Some(0);

	let err = riddle_config::validate(&cfg)
		.expect_err("Expected daemon.connect_timeout_ms validation error.");

	assert!(
		err.to_string().contains("daemon.connect_timeout_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn log_level_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.service.log_level = " ".to_string();

	assert!(riddle_config::validate(&cfg).is_err());
}

#[test]
fn out_of_range_port_is_a_parse_error() {
	let path = write_temp_config(sample_toml_with_daemon("127.0.0.1", 70_000));
	let result = riddle_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert!(matches!(result, Err(Error::ParseConfig { .. })));
}

#[test]
fn missing_file_is_a_read_error() {
	let path = env::temp_dir().join("riddle_config_test_missing.toml");
	let result = riddle_config::load(&path);

	assert!(matches!(result, Err(Error::ReadConfig { .. })));
}
