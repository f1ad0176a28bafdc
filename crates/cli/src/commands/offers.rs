use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use reserva_core::config::AppConfig;
use reserva_core::{LeaseContractLength, OfferFilter, OfferingClass, PriceOffer, PurchaseOption};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{load_catalog, render_json, CommandResult, EXIT_INPUT};

const COMMAND: &str = "offers";

#[derive(Debug, Clone, Default, Args)]
pub struct OffersArgs {
    #[arg(long, help = "Catalog snapshot (defaults to catalog.snapshot_path)")]
    pub catalog: Option<PathBuf>,
    #[arg(long)]
    pub instance_type: String,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long, help = "Operating system, e.g. Linux or Windows")]
    pub os: Option<String>,
    #[arg(long)]
    pub tenancy: Option<String>,
    #[arg(long)]
    pub pre_installed: Option<String>,
    #[arg(long, help = "standard|convertible")]
    pub offering_class: Option<String>,
    #[arg(long, help = "1yr|3yr")]
    pub lease: Option<String>,
    #[arg(long, help = "Cache or database engine, e.g. Redis or MySQL")]
    pub engine: Option<String>,
    #[arg(long, help = "e.g. \"No Upfront\" or all-upfront")]
    pub purchase_option: Option<String>,
}

#[derive(Debug, Serialize)]
struct OfferRow {
    sku: String,
    offer_term_code: String,
    usage_type: String,
    lease_contract_length: &'static str,
    purchase_option: &'static str,
    offering_class: &'static str,
    os_engine: String,
    on_demand: Decimal,
    reserved_hourly: Decimal,
    upfront: Decimal,
    breakeven_month: Option<u32>,
}

impl From<&PriceOffer> for OfferRow {
    fn from(offer: &PriceOffer) -> Self {
        Self {
            sku: offer.sku.0.clone(),
            offer_term_code: offer.offer_term_code.clone(),
            usage_type: offer.usage_type.clone(),
            lease_contract_length: offer.lease_contract_length.as_str(),
            purchase_option: offer.purchase_option.as_str(),
            offering_class: offer.offering_class.as_str(),
            os_engine: offer.engine_label().to_string(),
            on_demand: offer.on_demand,
            reserved_hourly: offer.reserved_hourly,
            upfront: offer.upfront,
            breakeven_month: offer.breakeven_point_in_month(),
        }
    }
}

pub fn run(config: &AppConfig, args: OffersArgs) -> CommandResult {
    let filters = match filters(&args) {
        Ok(filters) => filters,
        Err(message) => {
            return CommandResult::failure(COMMAND, "input_invalid", message, EXIT_INPUT)
        }
    };
    let catalog = match load_catalog(COMMAND, args.catalog.as_deref(), config) {
        Ok(catalog) => catalog,
        Err(result) => return result,
    };

    let offers = catalog.query(&args.instance_type, &filters);
    let rows: Vec<OfferRow> = offers.iter().map(|offer| OfferRow::from(offer.as_ref())).collect();
    render_json(COMMAND, &rows)
}

fn filters(args: &OffersArgs) -> Result<Vec<OfferFilter>, String> {
    let mut filters = Vec::new();
    if let Some(region) = &args.region {
        filters.push(OfferFilter::Region(region.clone()));
    }
    if let Some(os) = &args.os {
        filters.push(OfferFilter::OperatingSystem(os.clone()));
    }
    if let Some(tenancy) = &args.tenancy {
        filters.push(OfferFilter::Tenancy(tenancy.clone()));
    }
    if let Some(pre_installed) = &args.pre_installed {
        filters.push(OfferFilter::PreInstalled(pre_installed.clone()));
    }
    if let Some(engine) = &args.engine {
        filters.push(OfferFilter::Engine(engine.clone()));
    }
    if let Some(value) = &args.offering_class {
        filters.push(OfferFilter::OfferingClass(parse::<OfferingClass>(value)?));
    }
    if let Some(value) = &args.lease {
        filters.push(OfferFilter::LeaseContractLength(parse::<LeaseContractLength>(value)?));
    }
    if let Some(value) = &args.purchase_option {
        filters.push(OfferFilter::PurchaseOption(parse::<PurchaseOption>(value)?));
    }
    Ok(filters)
}

fn parse<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: ToString,
{
    value.parse::<T>().map_err(|error| error.to_string())
}
