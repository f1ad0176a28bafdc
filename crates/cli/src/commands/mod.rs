pub mod config;
pub mod forecast;
pub mod offers;
pub mod recommend;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use reserva_core::config::AppConfig;
use reserva_core::PricingCatalog;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_CATALOG: u8 = 3;
pub const EXIT_INPUT: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Catalog named on the command line, else `catalog.snapshot_path`.
pub(crate) fn load_catalog(
    command: &str,
    explicit: Option<&Path>,
    config: &AppConfig,
) -> Result<PricingCatalog, CommandResult> {
    let Some(path) = explicit.or(config.catalog.snapshot_path.as_deref()) else {
        return Err(CommandResult::failure(
            command,
            "catalog_unconfigured",
            "no catalog snapshot given; pass --catalog or set catalog.snapshot_path",
            EXIT_CONFIG,
        ));
    };

    PricingCatalog::load(path).map_err(|error| {
        CommandResult::failure(command, error.class(), error.to_string(), EXIT_CATALOG)
    })
}

/// Decode the JSON input document from `path`, or stdin when absent.
pub(crate) fn read_input<T: DeserializeOwned>(
    command: &str,
    path: Option<&Path>,
) -> Result<T, CommandResult> {
    decode_input(path).map_err(|error| {
        CommandResult::failure(command, "input_invalid", format!("{error:#}"), EXIT_INPUT)
    })
}

fn decode_input<T: DeserializeOwned>(path: Option<&Path>) -> Result<T> {
    let (raw, origin) = match path {
        Some(path) => (
            fs::read(path).with_context(|| format!("could not read `{}`", path.display()))?,
            path.display().to_string(),
        ),
        None => {
            let mut raw = Vec::new();
            io::stdin().read_to_end(&mut raw).context("could not read stdin")?;
            (raw, "stdin".to_string())
        }
    };

    serde_json::from_slice(&raw).with_context(|| format!("could not decode input from {origin}"))
}

pub(crate) fn render_json<T: Serialize>(command: &str, value: &T) -> CommandResult {
    match serde_json::to_string_pretty(value) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
    }
}
