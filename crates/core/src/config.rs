use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Base URL of the remote sheet service; required for the remote backend.
    pub base_url: Option<String>,
    /// Service-account access token, minted outside this process.
    pub access_token: Option<SecretString>,
    pub entries_table: String,
    pub sales_table: String,
    /// Read-cache lifetime. Staleness inside the window is tolerated;
    /// writes reload explicitly.
    pub cache_ttl_secs: u64,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Shared password gating both screens.
    pub password: SecretString,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    Remote,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub store_backend: Option<StoreBackend>,
    pub store_base_url: Option<String>,
    pub store_access_token: Option<String>,
    pub store_cache_ttl_secs: Option<u64>,
    pub auth_password: Option<String>,
    pub bind_address: Option<String>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Memory,
                base_url: None,
                access_token: None,
                entries_table: "registro_estoque".to_string(),
                sales_table: "vendas".to_string(),
                cache_ttl_secs: 3,
                timeout_secs: 30,
            },
            auth: AuthConfig { password: String::new().into() },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "remote" => Ok(Self::Remote),
            other => Err(ConfigError::Validation(format!(
                "unsupported store backend `{other}` (expected memory|remote)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("estoque.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(store) = patch.store {
            if let Some(backend) = store.backend {
                self.store.backend = backend;
            }
            if let Some(base_url) = store.base_url {
                self.store.base_url = Some(base_url);
            }
            if let Some(access_token_value) = store.access_token {
                self.store.access_token = Some(secret_value(access_token_value));
            }
            if let Some(entries_table) = store.entries_table {
                self.store.entries_table = entries_table;
            }
            if let Some(sales_table) = store.sales_table {
                self.store.sales_table = sales_table;
            }
            if let Some(cache_ttl_secs) = store.cache_ttl_secs {
                self.store.cache_ttl_secs = cache_ttl_secs;
            }
            if let Some(timeout_secs) = store.timeout_secs {
                self.store.timeout_secs = timeout_secs;
            }
        }

        if let Some(auth) = patch.auth {
            if let Some(password_value) = auth.password {
                self.auth.password = secret_value(password_value);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ESTOQUE_STORE_BACKEND") {
            self.store.backend = value.parse()?;
        }
        if let Some(value) = read_env("ESTOQUE_STORE_BASE_URL") {
            self.store.base_url = Some(value);
        }
        if let Some(value) = read_env("ESTOQUE_STORE_ACCESS_TOKEN") {
            self.store.access_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("ESTOQUE_STORE_ENTRIES_TABLE") {
            self.store.entries_table = value;
        }
        if let Some(value) = read_env("ESTOQUE_STORE_SALES_TABLE") {
            self.store.sales_table = value;
        }
        if let Some(value) = read_env("ESTOQUE_STORE_CACHE_TTL_SECS") {
            self.store.cache_ttl_secs = parse_u64("ESTOQUE_STORE_CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("ESTOQUE_STORE_TIMEOUT_SECS") {
            self.store.timeout_secs = parse_u64("ESTOQUE_STORE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ESTOQUE_AUTH_PASSWORD") {
            self.auth.password = secret_value(value);
        }

        if let Some(value) = read_env("ESTOQUE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("ESTOQUE_SERVER_PORT") {
            self.server.port = parse_u16("ESTOQUE_SERVER_PORT", &value)?;
        }

        let log_level = read_env("ESTOQUE_LOGGING_LEVEL").or_else(|| read_env("ESTOQUE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ESTOQUE_LOGGING_FORMAT").or_else(|| read_env("ESTOQUE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(backend) = overrides.store_backend {
            self.store.backend = backend;
        }
        if let Some(base_url) = overrides.store_base_url {
            self.store.base_url = Some(base_url);
        }
        if let Some(access_token) = overrides.store_access_token {
            self.store.access_token = Some(secret_value(access_token));
        }
        if let Some(cache_ttl_secs) = overrides.store_cache_ttl_secs {
            self.store.cache_ttl_secs = cache_ttl_secs;
        }
        if let Some(password) = overrides.auth_password {
            self.auth.password = secret_value(password);
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_store(&self.store)?;
        validate_auth(&self.auth)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("estoque.toml"), PathBuf::from("config/estoque.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    if store.entries_table.trim().is_empty() || store.sales_table.trim().is_empty() {
        return Err(ConfigError::Validation(
            "store.entries_table and store.sales_table must be non-empty".to_string(),
        ));
    }

    if store.cache_ttl_secs > 60 {
        return Err(ConfigError::Validation(
            "store.cache_ttl_secs must be at most 60 (the cache is a short read buffer, not a sync mechanism)".to_string(),
        ));
    }

    if store.timeout_secs == 0 || store.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "store.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if store.backend == StoreBackend::Remote {
        let base_url = store.base_url.as_deref().unwrap_or("").trim().to_string();
        if base_url.is_empty() {
            return Err(ConfigError::Validation(
                "store.base_url is required for the remote backend".to_string(),
            ));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "store.base_url must start with http:// or https://".to_string(),
            ));
        }

        let missing_token = store
            .access_token
            .as_ref()
            .map(|token| token.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing_token {
            return Err(ConfigError::Validation(
                "store.access_token is required for the remote backend".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_auth(auth: &AuthConfig) -> Result<(), ConfigError> {
    if auth.password.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "auth.password is required: both screens are password-gated".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation(
            "server.bind_address must be non-empty".to_string(),
        ));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    store: Option<StorePatch>,
    auth: Option<AuthPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    backend: Option<StoreBackend>,
    base_url: Option<String>,
    access_token: Option<String>,
    entries_table: Option<String>,
    sales_table: Option<String>,
    cache_ttl_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthPatch {
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, StoreBackend};

    fn options_with_password() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                auth_password: Some("segredo".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn defaults_fail_validation_without_a_password() {
        let error = AppConfig::default().validate().expect_err("password is required");
        assert!(error.to_string().contains("auth.password"));
    }

    #[test]
    fn memory_backend_with_password_override_is_valid() {
        let config = AppConfig::load(options_with_password()).expect("valid config");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.entries_table, "registro_estoque");
        assert_eq!(config.store.sales_table, "vendas");
        assert_eq!(config.store.cache_ttl_secs, 3);
    }

    #[test]
    fn remote_backend_requires_base_url_and_token() {
        let mut options = options_with_password();
        options.overrides.store_backend = Some(StoreBackend::Remote);

        let error = AppConfig::load(options.clone()).expect_err("base_url missing");
        assert!(error.to_string().contains("store.base_url"));

        options.overrides.store_base_url = Some("https://sheets.example.test".to_string());
        let error = AppConfig::load(options.clone()).expect_err("token missing");
        assert!(error.to_string().contains("store.access_token"));

        options.overrides.store_access_token = Some("svc-token".to_string());
        AppConfig::load(options).expect("remote config complete");
    }

    #[test]
    fn patch_file_values_are_applied() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[store]\nbackend = \"memory\"\ncache_ttl_secs = 5\n\n[server]\nbind_address = \"0.0.0.0\"\nport = 9090\n\n[logging]\nlevel = \"debug\"\nformat = \"json\"\n"
        )
        .expect("write config");

        let options = LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides {
                auth_password: Some("segredo".to_string()),
                ..ConfigOverrides::default()
            },
        };

        let config = AppConfig::load(options).expect("valid config");
        assert_eq!(config.store.cache_ttl_secs, 5);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let options = LoadOptions {
            config_path: Some("does/not/exist/estoque.toml".into()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        };

        let error = AppConfig::load(options).expect_err("file required");
        assert!(matches!(error, ConfigError::MissingConfigFile(_)));
    }

    #[test]
    fn file_interpolation_resolves_environment_variables() {
        std::env::set_var("ESTOQUE_CONFIG_TEST_BIND", "10.0.0.7");

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[server]\nbind_address = \"${{ESTOQUE_CONFIG_TEST_BIND}}\"\n")
            .expect("write config");

        let options = LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides {
                auth_password: Some("segredo".to_string()),
                ..ConfigOverrides::default()
            },
        };

        let config = AppConfig::load(options).expect("valid config");
        assert_eq!(config.server.bind_address, "10.0.0.7");

        std::env::remove_var("ESTOQUE_CONFIG_TEST_BIND");
    }

    #[test]
    fn unterminated_interpolation_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[server]\nbind_address = \"${{UNCLOSED\"").expect("write config");

        let options = LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        };

        let error = AppConfig::load(options).expect_err("unterminated interpolation");
        assert!(matches!(error, ConfigError::UnterminatedInterpolation));
    }

    #[test]
    fn backend_parses_from_str() {
        assert_eq!("remote".parse::<StoreBackend>().expect("valid"), StoreBackend::Remote);
        assert_eq!("MEMORY".parse::<StoreBackend>().expect("valid"), StoreBackend::Memory);
        assert!("cloud".parse::<StoreBackend>().is_err());
    }
}
