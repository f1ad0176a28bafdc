use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sku(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LeaseContractLength {
    #[serde(rename = "1yr")]
    OneYear,
    #[serde(rename = "3yr")]
    ThreeYears,
}

impl LeaseContractLength {
    pub fn years(self) -> u32 {
        match self {
            Self::OneYear => 1,
            Self::ThreeYears => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneYear => "1yr",
            Self::ThreeYears => "3yr",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PurchaseOption {
    #[serde(rename = "No Upfront")]
    NoUpfront,
    #[serde(rename = "Partial Upfront")]
    PartialUpfront,
    #[serde(rename = "All Upfront")]
    AllUpfront,
    #[serde(rename = "Light Utilization")]
    LightUtilization,
    #[serde(rename = "Medium Utilization")]
    MediumUtilization,
    #[serde(rename = "Heavy Utilization")]
    HeavyUtilization,
}

impl PurchaseOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoUpfront => "No Upfront",
            Self::PartialUpfront => "Partial Upfront",
            Self::AllUpfront => "All Upfront",
            Self::LightUtilization => "Light Utilization",
            Self::MediumUtilization => "Medium Utilization",
            Self::HeavyUtilization => "Heavy Utilization",
        }
    }

    /// Ordinal of the prepaid share of the commitment: 0 for the option with
    /// the least paid at purchase time. Utilization tiers rank alongside the
    /// upfront options (light ~ none, heavy ~ all).
    pub fn upfront_rank(self) -> u8 {
        match self {
            Self::NoUpfront | Self::LightUtilization => 0,
            Self::PartialUpfront | Self::MediumUtilization => 1,
            Self::AllUpfront | Self::HeavyUtilization => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferingClass {
    Standard,
    Convertible,
}

impl OfferingClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Convertible => "convertible",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported {field} `{value}`")]
pub struct ParseOfferFieldError {
    pub field: &'static str,
    pub value: String,
}

impl FromStr for LeaseContractLength {
    type Err = ParseOfferFieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1yr" | "1" => Ok(Self::OneYear),
            "3yr" | "3" => Ok(Self::ThreeYears),
            _ => Err(ParseOfferFieldError {
                field: "lease contract length",
                value: value.to_string(),
            }),
        }
    }
}

impl FromStr for PurchaseOption {
    type Err = ParseOfferFieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', '_'], " ").as_str() {
            "no upfront" => Ok(Self::NoUpfront),
            "partial upfront" => Ok(Self::PartialUpfront),
            "all upfront" => Ok(Self::AllUpfront),
            "light utilization" => Ok(Self::LightUtilization),
            "medium utilization" => Ok(Self::MediumUtilization),
            "heavy utilization" => Ok(Self::HeavyUtilization),
            _ => Err(ParseOfferFieldError { field: "purchase option", value: value.to_string() }),
        }
    }
}

impl FromStr for OfferingClass {
    type Err = ParseOfferFieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "convertible" => Ok(Self::Convertible),
            _ => Err(ParseOfferFieldError { field: "offering class", value: value.to_string() }),
        }
    }
}

/// The discriminated "engine" attribute of an offer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    OperatingSystem(String),
    CacheEngine(String),
    DatabaseEngine(String),
}

impl Engine {
    pub fn label(&self) -> &str {
        match self {
            Self::OperatingSystem(value)
            | Self::CacheEngine(value)
            | Self::DatabaseEngine(value) => value,
        }
    }
}

/// A reservation price offer as published in a catalog snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OfferRecord", into = "OfferRecord")]
pub struct PriceOffer {
    pub sku: Sku,
    pub offer_term_code: String,
    pub region: String,
    pub instance_type: String,
    pub usage_type: String,
    pub operation: String,
    pub lease_contract_length: LeaseContractLength,
    pub purchase_option: PurchaseOption,
    pub offering_class: OfferingClass,
    pub tenancy: String,
    pub pre_installed: String,
    pub engine: Engine,
    pub normalization_size_factor: Option<Decimal>,
    /// Hourly on-demand rate.
    pub on_demand: Decimal,
    /// Recurring hourly rate under the reservation; zero for All Upfront.
    pub reserved_hourly: Decimal,
    /// Price paid at purchase time per instance.
    pub upfront: Decimal,
    /// Reserved hours already committed under this offer.
    pub reserved_hours: Decimal,
}

impl PriceOffer {
    pub fn engine_label(&self) -> &str {
        self.engine.label()
    }
}

/// Flat on-disk shape of an offer. The three engine columns are mutually
/// exclusive; conversion into [`PriceOffer`] rejects records that populate
/// none or more than one of them.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct OfferRecord {
    sku: String,
    #[serde(default)]
    offer_term_code: String,
    region: String,
    instance_type: String,
    #[serde(default)]
    usage_type: String,
    #[serde(default)]
    operation: String,
    lease_contract_length: LeaseContractLength,
    purchase_option: PurchaseOption,
    #[serde(default = "default_offering_class")]
    offering_class: OfferingClass,
    #[serde(default)]
    tenancy: String,
    #[serde(default)]
    pre_installed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operating_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    normalization_size_factor: Option<Decimal>,
    on_demand: Decimal,
    #[serde(default)]
    reserved_hourly: Decimal,
    #[serde(default)]
    upfront: Decimal,
    #[serde(default)]
    reserved_hours: Decimal,
}

fn default_offering_class() -> OfferingClass {
    OfferingClass::Standard
}

impl TryFrom<OfferRecord> for PriceOffer {
    type Error = String;

    fn try_from(record: OfferRecord) -> Result<Self, Self::Error> {
        let populated = |value: Option<String>| value.filter(|value| !value.trim().is_empty());
        let engine = match (
            populated(record.operating_system),
            populated(record.cache_engine),
            populated(record.database_engine),
        ) {
            (Some(os), None, None) => Engine::OperatingSystem(os),
            (None, Some(cache), None) => Engine::CacheEngine(cache),
            (None, None, Some(database)) => Engine::DatabaseEngine(database),
            (None, None, None) => {
                return Err(format!(
                    "offer `{}` has no operating_system, cache_engine or database_engine",
                    record.sku
                ))
            }
            _ => {
                return Err(format!(
                    "offer `{}` populates more than one engine column \
                     (operating_system, cache_engine, database_engine)",
                    record.sku
                ))
            }
        };

        if record.on_demand.is_sign_negative()
            || record.reserved_hourly.is_sign_negative()
            || record.upfront.is_sign_negative()
            || record.reserved_hours.is_sign_negative()
        {
            return Err(format!("offer `{}` has a negative price or hour value", record.sku));
        }

        Ok(Self {
            sku: Sku(record.sku),
            offer_term_code: record.offer_term_code,
            region: record.region,
            instance_type: record.instance_type,
            usage_type: record.usage_type,
            operation: record.operation,
            lease_contract_length: record.lease_contract_length,
            purchase_option: record.purchase_option,
            offering_class: record.offering_class,
            tenancy: record.tenancy,
            pre_installed: record.pre_installed,
            engine,
            normalization_size_factor: record.normalization_size_factor,
            on_demand: record.on_demand,
            reserved_hourly: record.reserved_hourly,
            upfront: record.upfront,
            reserved_hours: record.reserved_hours,
        })
    }
}

impl From<PriceOffer> for OfferRecord {
    fn from(offer: PriceOffer) -> Self {
        let (operating_system, cache_engine, database_engine) = match offer.engine {
            Engine::OperatingSystem(os) => (Some(os), None, None),
            Engine::CacheEngine(cache) => (None, Some(cache), None),
            Engine::DatabaseEngine(database) => (None, None, Some(database)),
        };

        Self {
            sku: offer.sku.0,
            offer_term_code: offer.offer_term_code,
            region: offer.region,
            instance_type: offer.instance_type,
            usage_type: offer.usage_type,
            operation: offer.operation,
            lease_contract_length: offer.lease_contract_length,
            purchase_option: offer.purchase_option,
            offering_class: offer.offering_class,
            tenancy: offer.tenancy,
            pre_installed: offer.pre_installed,
            operating_system,
            cache_engine,
            database_engine,
            normalization_size_factor: offer.normalization_size_factor,
            on_demand: offer.on_demand,
            reserved_hourly: offer.reserved_hourly,
            upfront: offer.upfront,
            reserved_hours: offer.reserved_hours,
        }
    }
}
