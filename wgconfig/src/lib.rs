//! # WaveGate Configuration Module
//!
//! Configuration management for WaveGate, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use wgconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! let app_name = config.get_app_name();
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

/// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("wavegate.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load WaveGate configuration"));
}

const ENV_CONFIG_DIR: &str = "WAVEGATE_CONFIG";
const ENV_PREFIX: &str = "WAVEGATE_CONFIG__";

// Default values used when the YAML tree is missing or malformed
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_APP_NAME: &str = "audius-player";
const DEFAULT_TRENDING_LIMIT: usize = 20;
const DEFAULT_MAX_RETRIES: usize = 5;
const DEFAULT_RETRY_BASE_MS: u64 = 1000;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Macro to generate getter/setter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> usize {
            match self.get_value($path) {
                Ok(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap() as usize,
                Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap() as usize,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: usize) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value)))
        }
    };
}

/// Macro to generate getter/setter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> String {
            match self.get_value($path) {
                Ok(Value::String(s)) if !s.is_empty() => s,
                _ => $default.to_string(),
            }
        }

        pub fn $setter(&self, value: impl Into<String>) -> Result<()> {
            self.set_value($path, Value::String(value.into()))
        }
    };
}

/// Configuration manager for WaveGate
///
/// Loads the embedded defaults, merges an external `config.yaml` on top of
/// them and finally applies `WAVEGATE_CONFIG__*` environment overrides.
/// Access the process-wide instance through [`get_config`].
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.data.lock().unwrap().clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Current directory
        if Path::new(".wavegate").exists() {
            return ".wavegate".to_string();
        }

        // 4. Home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(".wavegate");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        ".wavegate".to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("Config path is not a directory"));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// Searched in order: the `directory` argument, `WAVEGATE_CONFIG`,
    /// `.wavegate` in the current directory, `.wavegate` in the home
    /// directory. The directory is created if missing.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created or validated
    pub fn config_dir(directory: &str) -> String {
        let dir_path = Self::find_config_dir(directory);
        let path = Path::new(&dir_path);

        Self::validate_config_dir(path).expect("Cannot validate the configuration directory");

        dir_path
    }

    /// Loads the configuration from the specified directory
    ///
    /// Merges, in order: embedded defaults, the external `config.yaml` if
    /// present, then `WAVEGATE_CONFIG__*` environment overrides. The merged
    /// result is written back so the on-disk file always shows the full tree.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory);
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file = %path, "Loaded config file");
            data
        } else {
            info!(config_file = %path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        let external_value: Value = serde_yaml::from_slice(&yaml_data)?;
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = Self::lower_keys_value(default_value);

        Self::apply_env_overrides(&mut config_value);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let data = self.data.lock().unwrap();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["server", "http_port"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        Self::set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()?;
        Ok(())
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key = path[0].to_lowercase();
            let key_value = Value::String(key);
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();

                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a mapping", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if key.starts_with(ENV_PREFIX) {
                let key_path = key
                    .trim_start_matches(ENV_PREFIX)
                    .split("__")
                    .collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        let new_key = Value::String(s.to_lowercase());
                        new_map.insert(new_key, Self::lower_keys_value(v));
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Gets the base URL for the HTTP server
    ///
    /// Returns the configured base URL, or `http://localhost` when unset.
    pub fn get_base_url(&self) -> String {
        match self.get_value(&["server", "base_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => "http://localhost".to_string(),
        }
    }

    /// Gets the HTTP port, falling back to 8080 when unset or invalid
    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["server", "http_port"]) {
            Ok(Value::Number(n)) if n.is_i64() => {
                u16::try_from(n.as_i64().unwrap()).unwrap_or(DEFAULT_HTTP_PORT)
            }
            Ok(Value::String(s)) => s.parse::<u16>().unwrap_or(DEFAULT_HTTP_PORT),
            _ => DEFAULT_HTTP_PORT,
        }
    }

    /// Sets the HTTP port
    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(
            &["server", "http_port"],
            Value::Number(Number::from(port as i64)),
        )
    }

    /// Gets the retry base delay in milliseconds
    pub fn get_retry_base_ms(&self) -> u64 {
        match self.get_value(&["player", "retry_base_ms"]) {
            Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap(),
            Ok(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap().max(0) as u64,
            _ => DEFAULT_RETRY_BASE_MS,
        }
    }

    impl_string_config!(get_app_name, set_app_name, &["proxy", "app_name"], DEFAULT_APP_NAME);
    impl_string_config!(get_log_level, set_log_level, &["log", "level"], DEFAULT_LOG_LEVEL);
    impl_usize_config!(
        get_trending_limit,
        set_trending_limit,
        &["proxy", "trending_limit"],
        DEFAULT_TRENDING_LIMIT
    );
    impl_usize_config!(
        get_max_retries,
        set_max_retries,
        &["player", "max_retries"],
        DEFAULT_MAX_RETRIES
    );

    /// The directory this configuration was loaded from
    pub fn get_config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Whether log output should also go to the console
    pub fn get_log_console(&self) -> bool {
        match self.get_value(&["log", "console"]) {
            Ok(Value::Bool(b)) => b,
            _ => true,
        }
    }
}

/// Recursively merges `other` into `base` (mappings merge key-wise, any other
/// value in `other` replaces the one in `base`)
fn merge_yaml(base: &mut Value, other: &Value) {
    match (base, other) {
        (Value::Mapping(base_map), Value::Mapping(other_map)) => {
            for (k, v) in other_map {
                match base_map.get_mut(k) {
                    Some(base_v) => merge_yaml(base_v, v),
                    None => {
                        base_map.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (base_v, other_v) => {
            *base_v = other_v.clone();
        }
    }
}

/// Returns the process-wide configuration instance
///
/// The configuration is loaded on first access and shared afterwards.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &Path) -> Config {
        Config::load_config(dir.to_str().unwrap()).unwrap()
    }

    #[test]
    fn embedded_defaults_parse() {
        let value: Value = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(matches!(value, Value::Mapping(_)));
    }

    #[test]
    fn defaults_are_exposed_through_getters() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        assert_eq!(config.get_http_port(), DEFAULT_HTTP_PORT);
        assert_eq!(config.get_app_name(), DEFAULT_APP_NAME);
        assert_eq!(config.get_trending_limit(), DEFAULT_TRENDING_LIMIT);
        assert_eq!(config.get_max_retries(), DEFAULT_MAX_RETRIES);
        assert_eq!(config.get_retry_base_ms(), DEFAULT_RETRY_BASE_MS);
        assert!(config.get_log_console());
    }

    #[test]
    fn set_value_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        config.set_http_port(9090).unwrap();
        assert_eq!(config.get_http_port(), 9090);

        config.set_app_name("test-player").unwrap();
        assert_eq!(config.get_app_name(), "test-player");
    }

    #[test]
    fn out_of_range_port_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "server:\n  http_port: 70000\n",
        )
        .unwrap();

        let config = test_config(dir.path());
        assert_eq!(config.get_http_port(), DEFAULT_HTTP_PORT);

        config
            .set_value(
                &["server", "http_port"],
                Value::Number(Number::from(-1i64)),
            )
            .unwrap();
        assert_eq!(config.get_http_port(), DEFAULT_HTTP_PORT);
    }

    #[test]
    fn external_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "server:\n  http_port: 3000\n",
        )
        .unwrap();

        let config = test_config(dir.path());
        assert_eq!(config.get_http_port(), 3000);
        // Untouched sections keep their defaults
        assert_eq!(config.get_app_name(), DEFAULT_APP_NAME);
    }

    #[test]
    fn merge_replaces_scalars_and_merges_maps() {
        let mut base: Value = serde_yaml::from_str("a:\n  b: 1\n  c: 2\n").unwrap();
        let other: Value = serde_yaml::from_str("a:\n  b: 9\nd: 4\n").unwrap();
        merge_yaml(&mut base, &other);

        let a_b = Config::get_value_internal(&base, &["a", "b"]).unwrap();
        let a_c = Config::get_value_internal(&base, &["a", "c"]).unwrap();
        let d = Config::get_value_internal(&base, &["d"]).unwrap();
        assert_eq!(a_b, Value::Number(Number::from(9)));
        assert_eq!(a_c, Value::Number(Number::from(2)));
        assert_eq!(d, Value::Number(Number::from(4)));
    }
}
