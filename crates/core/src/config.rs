use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::offer::OfferingClass;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub recommend: RecommendConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogConfig {
    /// Snapshot used when a command is not given `--catalog`.
    pub snapshot_path: Option<PathBuf>,
}

/// Offer attributes assumed when a usage record does not carry them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecommendConfig {
    pub default_tenancy: String,
    pub default_pre_installed: String,
    pub default_offering_class: OfferingClass,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub catalog_snapshot_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
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
            catalog: CatalogConfig { snapshot_path: None },
            recommend: RecommendConfig {
                default_tenancy: "Shared".to_string(),
                default_pre_installed: "NA".to_string(),
                default_offering_class: OfferingClass::Standard,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("reserva.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(snapshot_path) = catalog.snapshot_path {
                self.catalog.snapshot_path = Some(snapshot_path);
            }
        }

        if let Some(recommend) = patch.recommend {
            if let Some(tenancy) = recommend.default_tenancy {
                self.recommend.default_tenancy = tenancy;
            }
            if let Some(pre_installed) = recommend.default_pre_installed {
                self.recommend.default_pre_installed = pre_installed;
            }
            if let Some(offering_class) = recommend.default_offering_class {
                self.recommend.default_offering_class = offering_class;
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
        if let Some(value) = read_env("RESERVA_CATALOG_SNAPSHOT_PATH") {
            self.catalog.snapshot_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("RESERVA_RECOMMEND_DEFAULT_TENANCY") {
            self.recommend.default_tenancy = value;
        }
        if let Some(value) = read_env("RESERVA_RECOMMEND_DEFAULT_PRE_INSTALLED") {
            self.recommend.default_pre_installed = value;
        }
        if let Some(value) = read_env("RESERVA_RECOMMEND_DEFAULT_OFFERING_CLASS") {
            self.recommend.default_offering_class =
                parse_offering_class("RESERVA_RECOMMEND_DEFAULT_OFFERING_CLASS", &value)?;
        }

        let log_level =
            read_env("RESERVA_LOGGING_LEVEL").or_else(|| read_env("RESERVA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("RESERVA_LOGGING_FORMAT").or_else(|| read_env("RESERVA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(snapshot_path) = overrides.catalog_snapshot_path {
            self.catalog.snapshot_path = Some(snapshot_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_recommend(&self.recommend)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("reserva.toml"), PathBuf::from("config/reserva.toml")]
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

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if let Some(path) = &catalog.snapshot_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.snapshot_path must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_recommend(recommend: &RecommendConfig) -> Result<(), ConfigError> {
    if recommend.default_tenancy.trim().is_empty() {
        return Err(ConfigError::Validation(
            "recommend.default_tenancy must not be empty (catalog values: Shared|Dedicated|Host)"
                .to_string(),
        ));
    }

    if recommend.default_pre_installed.trim().is_empty() {
        return Err(ConfigError::Validation(
            "recommend.default_pre_installed must not be empty (use `NA` for no software)"
                .to_string(),
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

fn parse_offering_class(key: &str, value: &str) -> Result<OfferingClass, ConfigError> {
    value.parse::<OfferingClass>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    recommend: Option<RecommendPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendPatch {
    default_tenancy: Option<String>,
    default_pre_installed: Option<String>,
    default_offering_class: Option<OfferingClass>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
