use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use reserva_core::config::AppConfig;
use toml::Value;

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run(config: &AppConfig, explicit_path: Option<&Path>) -> String {
    let config_file_path = detect_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let snapshot_path = config
        .catalog
        .snapshot_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());

    let fields = [
        Field {
            key_path: "catalog.snapshot_path",
            env_keys: &["RESERVA_CATALOG_SNAPSHOT_PATH"],
            value: snapshot_path,
        },
        Field {
            key_path: "recommend.default_tenancy",
            env_keys: &["RESERVA_RECOMMEND_DEFAULT_TENANCY"],
            value: config.recommend.default_tenancy.clone(),
        },
        Field {
            key_path: "recommend.default_pre_installed",
            env_keys: &["RESERVA_RECOMMEND_DEFAULT_PRE_INSTALLED"],
            value: config.recommend.default_pre_installed.clone(),
        },
        Field {
            key_path: "recommend.default_offering_class",
            env_keys: &["RESERVA_RECOMMEND_DEFAULT_OFFERING_CLASS"],
            value: config.recommend.default_offering_class.as_str().to_string(),
        },
        Field {
            key_path: "logging.level",
            env_keys: &["RESERVA_LOGGING_LEVEL", "RESERVA_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["RESERVA_LOGGING_FORMAT", "RESERVA_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }
    lines.join("\n")
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("reserva.toml"), PathBuf::from("config/reserva.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
