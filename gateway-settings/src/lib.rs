//! Typed application settings with env-var overrides, following the
//! reference project's `config::Config` + `Environment::with_prefix(...)`
//! loading pattern (see `syncserver-settings`).
#[macro_use]
extern crate slog_scope;

mod backoff_kind;

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use gateway_db_common::{DatabaseDescriptor, Dialect};
use serde::{Deserialize, Serialize};

pub use backoff_kind::BackoffKind;

static PREFIX: &str = "gateway";

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub databases: Vec<DatabaseSettings>,
    pub llm: LlmSettings,
    pub security: SecuritySettings,
    pub cache: CacheSettings,
    pub resilience: ResilienceSettings,
    pub observability: ObservabilitySettings,
    pub shutdown: ShutdownSettings,

    /// Per-request wall-clock deadline, in seconds (spec §5, default 60s).
    pub request_deadline_s: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            databases: Vec::new(),
            llm: LlmSettings::default(),
            security: SecuritySettings::default(),
            cache: CacheSettings::default(),
            resilience: ResilienceSettings::default(),
            observability: ObservabilitySettings::default(),
            shutdown: ShutdownSettings::default(),
            request_deadline_s: 60,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub name: String,
    pub dialect: Dialect,
    pub uri: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub statement_timeout_s: u64,
    pub row_cap: Option<u32>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            dialect: Dialect::Postgres,
            uri: String::new(),
            pool_min: 1,
            pool_max: 10,
            statement_timeout_s: 30,
            row_cap: None,
        }
    }
}

impl DatabaseSettings {
    pub fn to_descriptor(&self) -> DatabaseDescriptor {
        DatabaseDescriptor {
            name: self.name.clone(),
            dialect: self.dialect,
            connection_uri: self.uri.clone(),
            pool_min: self.pool_min,
            pool_max: self.pool_max,
            statement_timeout: Duration::from_secs(self.statement_timeout_s),
            row_cap: self.row_cap,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_s: u64,
    pub api_key: String,
    /// Maximum prompt size (in approximate tokens) the assembler may emit
    /// (spec §4.4).
    pub prompt_token_budget: u32,
    /// Number of additional LLM generation attempts after an unsafe/invalid
    /// SQL refusal (spec's "remediation cycle", default 1).
    pub remediation_budget: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider_url: "https://api.example-llm.invalid/v1/complete".to_owned(),
            model: "gateway-sql-1".to_owned(),
            max_tokens: 1024,
            temperature: 0.0,
            timeout_s: 15,
            api_key: String::new(),
            prompt_token_budget: 6000,
            remediation_budget: 1,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Parsed and validated at load (spec §6), but not yet wired into the
    /// safety gate: `gateway-executor` always runs a validated statement
    /// inside a read-only transaction (spec §4.6 step 2), so widening the
    /// gate alone would let a write-shaped statement through only to be
    /// rejected by the database. See `gateway-sql-safety::SafetyPolicy`.
    pub allow_write: bool,
    pub blocked_functions: Vec<String>,
    pub max_rows: u32,
    pub allow_explain: bool,
    /// Optional table/schema allowlist. Empty means unrestricted.
    pub allowed_relations: Vec<String>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            allow_write: false,
            blocked_functions: default_blocked_functions(),
            max_rows: 10_000,
            allow_explain: false,
            allowed_relations: Vec::new(),
        }
    }
}

pub fn default_blocked_functions() -> Vec<String> {
    [
        "pg_sleep",
        "sleep",
        "benchmark",
        "pg_read_file",
        "pg_read_binary_file",
        "pg_write_file",
        "load_file",
        "lo_import",
        "lo_export",
        "dblink",
        "dblink_connect",
        "pg_terminate_backend",
        "pg_cancel_backend",
        "current_setting",
        "set_config",
        "xp_cmdshell",
        "sys_exec",
        "sys_eval",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub schema_ttl_s: u64,
    pub refresh_background: bool,
    /// Interval at which the background revalidation task scans for
    /// expired entries (spec §4.2 "cooperative task").
    pub background_interval_s: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            schema_ttl_s: 3600,
            refresh_background: true,
            background_interval_s: 30,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ResilienceSettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub backoff: BackoffKind,
    pub breaker_threshold: u32,
    pub breaker_cooldown_s: u64,
    pub rate_limit_rps: f64,
    pub rate_limit_burst: u32,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            backoff: BackoffKind::Exponential,
            breaker_threshold: 5,
            breaker_cooldown_s: 30,
            rate_limit_rps: 5.0,
            rate_limit_burst: 10,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    pub log_level: String,
    pub log_format: LogFormat,
    pub metrics_port: u16,
    pub statsd_host: Option<String>,
    pub statsd_port: u16,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: LogFormat::Json,
            metrics_port: 9090,
            statsd_host: None,
            statsd_port: 8125,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Human,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownSettings {
    pub deadline_s: u64,
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self { deadline_s: 10 }
    }
}

impl Settings {
    /// Load settings from an optional TOML config file, then apply
    /// `GATEWAY_`-prefixed, double-underscore-separated environment
    /// overrides (e.g. `GATEWAY_SECURITY__MAX_ROWS=500`), exactly as the
    /// reference project's `Settings::with_env_and_config_file` does.
    pub fn with_env_and_config_file(filename: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = filename {
            builder = builder.add_source(File::with_name(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(&PREFIX.to_uppercase())
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        settings.validate().map_err(ConfigError::Message)?;
        Ok(settings)
    }

    /// Startup-time validation (spec §7 `config_error`, fatal). Not
    /// exhaustive, but catches the mistakes that would otherwise surface as
    /// confusing runtime failures much later.
    pub fn validate(&self) -> Result<(), String> {
        if self.databases.is_empty() {
            warn!("no databases configured at startup");
        }

        let mut seen = std::collections::HashSet::new();
        for db in &self.databases {
            if db.name.is_empty() {
                return Err("database entry missing `name`".to_owned());
            }
            if !seen.insert(db.name.clone()) {
                return Err(format!("duplicate database name {:?}", db.name));
            }
            if db.uri.is_empty() {
                return Err(format!("database {:?} missing `uri`", db.name));
            }
            if db.pool_min > db.pool_max {
                return Err(format!(
                    "database {:?}: pool_min ({}) exceeds pool_max ({})",
                    db.name, db.pool_min, db.pool_max
                ));
            }
            if let Some(cap) = db.row_cap {
                if cap == 0 {
                    return Err(format!("database {:?}: row_cap must be > 0", db.name));
                }
            }
        }

        if self.security.max_rows == 0 {
            return Err("security.max_rows must be > 0".to_owned());
        }

        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn test_settings() -> Self {
        let mut settings = Settings::default();
        settings.port = 0;
        settings
    }

    pub fn banner(&self) -> String {
        format!(
            "http://{}:{} ({} databases registered)",
            self.host,
            self.port,
            self.databases.len()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_duplicate_database_names() {
        let mut settings = Settings::default();
        settings.databases = vec![
            DatabaseSettings {
                name: "blog".into(),
                uri: "postgres://localhost/blog".into(),
                ..Default::default()
            },
            DatabaseSettings {
                name: "blog".into(),
                uri: "mysql://localhost/blog".into(),
                dialect: Dialect::Mysql,
                ..Default::default()
            },
        ];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let mut settings = Settings::default();
        settings.databases = vec![DatabaseSettings {
            name: "blog".into(),
            uri: "postgres://localhost/blog".into(),
            pool_min: 10,
            pool_max: 2,
            ..Default::default()
        }];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn accepts_well_formed_settings() {
        let mut settings = Settings::default();
        settings.databases = vec![DatabaseSettings {
            name: "blog".into(),
            uri: "postgres://localhost/blog".into(),
            ..Default::default()
        }];
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn environment_variable_prefix_overrides_defaults() {
        std::env::set_var("GATEWAY_SECURITY__MAX_ROWS", "250");
        let settings = Settings::with_env_and_config_file(None).unwrap();
        assert_eq!(settings.security.max_rows, 250);
        std::env::remove_var("GATEWAY_SECURITY__MAX_ROWS");
    }
}
