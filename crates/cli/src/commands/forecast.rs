use std::path::PathBuf;

use clap::Args;
use reserva_core::config::AppConfig;
use reserva_core::{Forecast, Sku};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{load_catalog, read_input, render_json, CommandResult, EXIT_INPUT};

const COMMAND: &str = "forecast";

#[derive(Debug, Clone, Args)]
pub struct ForecastArgs {
    #[arg(long, help = "Catalog snapshot (defaults to catalog.snapshot_path)")]
    pub catalog: Option<PathBuf>,
    #[arg(long)]
    pub sku: String,
    #[arg(long, help = "Pick one offer term when the SKU has several")]
    pub offer_term_code: Option<String>,
    #[arg(long, help = "JSON array of {month, instance_num}; stdin when omitted")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ForecastSplit {
    sku: String,
    offer_term_code: String,
    lease_contract_length: &'static str,
    purchase_option: &'static str,
    months: usize,
    committed_instance_num: Decimal,
    on_demand_instance_num: Decimal,
    reserved_instance_num: Decimal,
}

pub fn run(config: &AppConfig, args: ForecastArgs) -> CommandResult {
    let catalog = match load_catalog(COMMAND, args.catalog.as_deref(), config) {
        Ok(catalog) => catalog,
        Err(result) => return result,
    };

    let sku = Sku(args.sku.clone());
    let matching = catalog.all().narrow(|offer| {
        offer.sku == sku
            && args.offer_term_code.as_ref().map_or(true, |code| &offer.offer_term_code == code)
    });
    let Some(offer) = matching.first() else {
        return CommandResult::failure(
            COMMAND,
            "offer_not_found",
            format!("no catalog offer with sku `{}`", args.sku),
            EXIT_INPUT,
        );
    };

    let forecast: Vec<Forecast> = match read_input(COMMAND, args.input.as_deref()) {
        Ok(forecast) => forecast,
        Err(result) => return result,
    };

    let Some(split) = offer.expected_instance_num(&forecast) else {
        return CommandResult::failure(
            COMMAND,
            "input_invalid",
            "forecast instance counts exceed the representable range",
            EXIT_INPUT,
        );
    };
    render_json(
        COMMAND,
        &ForecastSplit {
            sku: offer.sku.0.clone(),
            offer_term_code: offer.offer_term_code.clone(),
            lease_contract_length: offer.lease_contract_length.as_str(),
            purchase_option: offer.purchase_option.as_str(),
            months: forecast.len(),
            committed_instance_num: offer.committed_instance_num().normalize(),
            on_demand_instance_num: split.on_demand_instance_num,
            reserved_instance_num: split.reserved_instance_num,
        },
    )
}
