//! Loader for `trawl.yaml` with environment overlays.
//!
//! Sources are merged in the order they are added; `TRAWL__`-prefixed environment
//! variables (`TRAWL__AUTH_TOKEN`, `TRAWL__LOGGING__FORMAT`, ...) always win. String
//! values may reference `${VAR}` placeholders, expanded after merging.
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use trawl_common::LogFormat;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct TrawlConfig {
    #[serde(default)]
    pub version: Option<String>,
    /// API token sent as the `token` query parameter.
    #[serde(default)]
    pub auth_token: String,
    /// Overrides the client's built-in search URL when set.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub tls: TlsMode,
    /// Upper bound on pages fetched per search by the CLI.
    #[serde(default, deserialize_with = "lenient_opt_usize")]
    pub max_pages: Option<usize>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TrawlConfig {
    fn default() -> Self {
        Self {
            version: None,
            auth_token: String::new(),
            endpoint: None,
            tls: TlsMode::default(),
            max_pages: None,
            logging: LoggingConfig::default(),
        }
    }
}

/// Certificate verification for the search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    #[default]
    Strict,
    AcceptAny,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub stderr: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            stderr: false,
            filter: default_filter(),
            dir: None,
        }
    }
}

fn default_filter() -> String {
    "info".into()
}

// Environment overrides always arrive as strings.
fn lenient_opt_usize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| serde::de::Error::custom(format!("expected a page count, got {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a page count, got {s:?}"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a page count, got {other}"
        ))),
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match Value::deserialize(d)? {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            other => Err(serde::de::Error::custom(format!("expected a boolean, got {other:?}"))),
        },
        other => Err(serde::de::Error::custom(format!("expected a boolean, got {other}"))),
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// `<config dir>/trawl/trawl.yaml`, e.g. `~/.config/trawl/trawl.yaml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trawl").join("trawl.yaml"))
}

/// Builder over the `config` crate wiring (YAML + env overrides).
pub struct TrawlConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for TrawlConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrawlConfigLoader {
    /// Start with no files; only `TRAWL__` environment overrides.
    ///
    /// ```
    /// use trawl_config::{TlsMode, TrawlConfigLoader};
    ///
    /// let config = TrawlConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nauth_token: abc")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.auth_token, "abc");
    /// assert_eq!(config.endpoint, None);
    /// assert_eq!(config.tls, TlsMode::Strict);
    /// ```
    pub fn new() -> Self {
        Self { builder: Config::builder() }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use trawl_config::{TlsMode, TrawlConfigLoader};
    ///
    /// let cfg = TrawlConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// auth_token: "example"
    /// endpoint: "https://mirror.example.com/posts_full/"
    /// tls: accept_any
    /// max_pages: 3
    /// logging:
    ///   format: json
    ///   stderr: true
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.tls, TlsMode::AcceptAny);
    /// assert_eq!(cfg.endpoint.as_deref(), Some("https://mirror.example.com/posts_full/"));
    /// assert_eq!(cfg.max_pages, Some(3));
    /// assert!(cfg.logging.stderr);
    /// assert_eq!(cfg.logging.filter, "info");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, and deserialize.
    ///
    /// ```
    /// use trawl_config::TrawlConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOC_TRAWL_TOKEN", "injected-from-env"); }
    ///
    /// let config = TrawlConfigLoader::new()
    ///     .with_yaml_str(r#"auth_token: "${DOC_TRAWL_TOKEN}""#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.auth_token, "injected-from-env");
    ///
    /// unsafe { std::env::remove_var("DOC_TRAWL_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<TrawlConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(Environment::with_prefix("TRAWL").separator("__"))
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        // An empty merge comes back as unit/null rather than an empty map.
        if v.is_null() {
            v = Value::Object(Default::default());
        }
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))
    }
}
