use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppCfg {
    #[serde(default)]
    pub http: HttpCfg,
    #[serde(default)]
    pub scryfall: ScryfallCfg,
    #[serde(default)]
    pub charts: ChartsCfg,
    #[serde(default)]
    pub server: ServerCfg,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpCfg {
    #[serde(default = "default_ua")]
    pub user_agent: String,
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_pool_idle")]
    pub pool_idle_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_keep_alive")]
    pub tcp_keep_alive: Duration,
    #[serde(default = "default_pool")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            user_agent: default_ua(),
            timeout: default_timeout(),
            pool_idle_timeout: default_pool_idle(),
            tcp_keep_alive: default_keep_alive(),
            pool_max_idle_per_host: default_pool(),
        }
    }
}
fn default_ua() -> String {
    "deckstat/0.1".into()
}
fn default_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_pool_idle() -> Duration {
    Duration::from_secs(90)
}
fn default_keep_alive() -> Duration {
    Duration::from_secs(60)
}
fn default_pool() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScryfallCfg {
    #[serde(default = "default_scryfall_url")]
    pub base_url: String,
    /// Minimum spacing between two consecutive card lookups.
    #[serde(with = "humantime_serde", default = "default_rate_limit_delay")]
    pub rate_limit_delay: Duration,
}

impl Default for ScryfallCfg {
    fn default() -> Self {
        Self {
            base_url: default_scryfall_url(),
            rate_limit_delay: default_rate_limit_delay(),
        }
    }
}
fn default_scryfall_url() -> String {
    "https://api.scryfall.com".to_string()
}
fn default_rate_limit_delay() -> Duration {
    Duration::from_millis(100)
}

/// Image format of the base64 charts in an analysis.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChartsCfg {
    #[serde(default)]
    pub format: ChartFormat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerCfg {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_origins: default_cors_origins(),
            max_upload_bytes: default_max_upload(),
        }
    }
}
fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_max_upload() -> usize {
    1024 * 1024
}

const ENV_PREFIX: &str = "DECKSTAT";

impl AppCfg {
    /// Layers the (optional) config file under `DECKSTAT_`-prefixed environment
    /// overrides, with `__` between nesting levels (`DECKSTAT_SCRYFALL__BASE_URL`).
    ///
    /// The config crate lowercases every key, so field names stay snake_case.
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`AppCfg::load`], reading overrides from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(path: &str, env: Option<Map<String, String>>) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .context("building config")?;

        let app: AppCfg = cfg.try_deserialize().context("deserializing config")?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.scryfall.base_url.is_empty(),
            "scryfall.base_url missing"
        );
        anyhow::ensure!(
            !self.scryfall.rate_limit_delay.is_zero(),
            "scryfall.rate_limit_delay must be > 0"
        );
        anyhow::ensure!(!self.server.bind_addr.is_empty(), "server.bind_addr missing");
        anyhow::ensure!(
            self.server.max_upload_bytes > 0,
            "server.max_upload_bytes must be > 0"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppCfg::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.http.timeout, Duration::from_secs(10));
        assert_eq!(cfg.scryfall.rate_limit_delay, Duration::from_millis(100));
        assert_eq!(cfg.scryfall.base_url, "https://api.scryfall.com");
        assert_eq!(cfg.server.cors_origins, vec!["*".to_string()]);
        assert_eq!(cfg.charts.format, ChartFormat::Png);
    }

    #[test]
    fn test_chart_format_from_env() {
        let cfg = AppCfg::load_with_env(
            "does-not-exist-deckstat",
            env(&[("DECKSTAT_CHARTS__FORMAT", "svg")]),
        )
        .unwrap();
        assert_eq!(cfg.charts.format, ChartFormat::Svg);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let cfg = AppCfg::load("does-not-exist-deckstat").unwrap();
        assert_eq!(cfg.server.bind_addr, "0.0.0.0:8000");
        assert_eq!(cfg.http.user_agent, "deckstat/0.1");
    }

    #[test]
    fn test_load_yaml_file() {
        let path = std::env::temp_dir().join(format!("deckstat-cfg-{}.yml", std::process::id()));
        fs::write(
            &path,
            "scryfall:\n  base_url: http://localhost:9999\n  rate_limit_delay: 250ms\nhttp:\n  timeout: 3s\n  user_agent: deck-test\nserver:\n  bind_addr: 127.0.0.1:9000\n  cors_origins:\n    - http://localhost:5173\n",
        )
        .unwrap();

        let cfg = AppCfg::load(path.to_str().unwrap()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(cfg.scryfall.base_url, "http://localhost:9999");
        assert_eq!(cfg.scryfall.rate_limit_delay, Duration::from_millis(250));
        assert_eq!(cfg.http.timeout, Duration::from_secs(3));
        assert_eq!(cfg.http.user_agent, "deck-test");
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.server.cors_origins, vec!["http://localhost:5173".to_string()]);
        // untouched keys keep their defaults
        assert_eq!(cfg.server.max_upload_bytes, 1024 * 1024);
        assert_eq!(cfg.http.pool_max_idle_per_host, 4);
    }

    fn env(vars: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        let cfg = AppCfg::load_with_env(
            "does-not-exist-deckstat",
            env(&[
                ("DECKSTAT_SCRYFALL__BASE_URL", "http://scryfall.test:1"),
                ("DECKSTAT_SCRYFALL__RATE_LIMIT_DELAY", "250ms"),
                ("DECKSTAT_SERVER__MAX_UPLOAD_BYTES", "2048"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.scryfall.base_url, "http://scryfall.test:1");
        assert_eq!(cfg.scryfall.rate_limit_delay, Duration::from_millis(250));
        assert_eq!(cfg.server.max_upload_bytes, 2048);
    }

    #[test]
    fn test_env_override_beats_file() {
        let path = std::env::temp_dir().join(format!("deckstat-env-{}.yml", std::process::id()));
        fs::write(&path, "scryfall:\n  base_url: http://from-file\n").unwrap();

        let cfg = AppCfg::load_with_env(
            path.to_str().unwrap(),
            env(&[("DECKSTAT_SCRYFALL__BASE_URL", "http://from-env")]),
        )
        .unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(cfg.scryfall.base_url, "http://from-env");
    }

    #[test]
    fn test_unprefixed_env_is_ignored() {
        let cfg = AppCfg::load_with_env(
            "does-not-exist-deckstat",
            env(&[
                ("HTTP", "1"),
                ("SERVER", "prod"),
                ("SCRYFALL__BASE_URL", "http://ignored"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.scryfall.base_url, "https://api.scryfall.com");
        assert_eq!(cfg.server.bind_addr, "0.0.0.0:8000");
    }

    #[test]
    fn test_validate_rejects_zero_delay() {
        let mut cfg = AppCfg::default();
        cfg.scryfall.rate_limit_delay = Duration::ZERO;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("rate_limit_delay"));
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let mut cfg = AppCfg::default();
        cfg.scryfall.base_url.clear();
        assert!(cfg.validate().is_err());
    }
}
