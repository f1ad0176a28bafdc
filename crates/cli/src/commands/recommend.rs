use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use reserva_core::config::AppConfig;
use reserva_core::{
    PurchaseRequest, RecommendDefaults, RecommendationEngine, RecommendationRecord, Recommended,
    UsageQuantity,
};
use tracing::warn;

use super::{load_catalog, read_input, CommandResult, EXIT_INPUT};

const COMMAND: &str = "recommend";

pub const CSV_HEADER: &str = "usage_type, lease_contract_length, purchase_option, os/engine, \
total_hours, ondemand_hours, reserved_hours, reserved_instance_num, \
full_ondemand_cost, reserved_applied_cost, saving_cost";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "Catalog snapshot (defaults to catalog.snapshot_path)")]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Input document; stdin when omitted")]
    pub input: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
    #[arg(long, help = "Input is raw usage records rather than price/quantity purchases")]
    pub from_usage: bool,
}

/// Exit code is 0 only when every purchase or usage group produced a
/// recommendation; failures are logged and the remaining rows still print.
pub fn run(config: &AppConfig, args: RecommendArgs) -> CommandResult {
    let catalog = match load_catalog(COMMAND, args.catalog.as_deref(), config) {
        Ok(catalog) => catalog,
        Err(result) => return result,
    };
    let engine = RecommendationEngine::with_defaults(
        Arc::new(catalog),
        RecommendDefaults::from(&config.recommend),
    );

    let report = if args.from_usage {
        match read_input::<Vec<UsageQuantity>>(COMMAND, args.input.as_deref()) {
            Ok(records) => engine.recommend_usage(&records),
            Err(result) => return result,
        }
    } else {
        match read_input::<Vec<PurchaseRequest>>(COMMAND, args.input.as_deref()) {
            Ok(purchases) => engine.recommend_batch(&purchases),
            Err(result) => return result,
        }
    };

    for failure in &report.errors {
        warn!(
            event_name = "cli.recommend.failed",
            subject = %failure.subject,
            error_class = failure.error.class(),
            error = %failure.error,
            "no recommendation produced"
        );
    }

    let records: Vec<RecommendationRecord> =
        report.recommended.iter().map(Recommended::record).collect();
    let output = match args.format {
        OutputFormat::Json => match render_json_lines(&records) {
            Ok(output) => output,
            Err(error) => {
                return CommandResult::failure(COMMAND, "serialization", error.to_string(), 1)
            }
        },
        OutputFormat::Csv => render_csv(&records),
    };

    let exit_code = if report.errors.is_empty() { 0 } else { EXIT_INPUT };
    CommandResult { exit_code, output }
}

pub fn render_json_lines(records: &[RecommendationRecord]) -> serde_json::Result<String> {
    let lines = records.iter().map(serde_json::to_string).collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

pub fn render_csv(records: &[RecommendationRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for record in records {
        let fields = [
            csv_field(&record.usage_type),
            csv_field(&record.lease_contract_length),
            csv_field(&record.purchase_option),
            csv_field(&record.os_engine),
            record.total_hours.to_string(),
            record.on_demand_hours.to_string(),
            record.reserved_hours.to_string(),
            record.reserved_instance_num.to_string(),
            record.full_on_demand_cost.to_string(),
            record.reserved_applied_cost.to_string(),
            record.saving_cost.to_string(),
        ];
        lines.push(fields.join(", "));
    }
    lines.join("\n")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
