use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::offer::Engine;
use crate::errors::InvalidUsageDimensionError;

/// Billing usage kind, the middle segment of an AWS usage type
/// (`APN1-BoxUsage:m4.large`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UsageKind {
    BoxUsage,
    NodeUsage,
    InstanceUsage,
    #[serde(rename = "Multi-AZUsage")]
    MultiAzUsage,
}

impl UsageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BoxUsage => "BoxUsage",
            Self::NodeUsage => "NodeUsage",
            Self::InstanceUsage => "InstanceUsage",
            Self::MultiAzUsage => "Multi-AZUsage",
        }
    }

    /// Whether a catalog usage type string belongs to this kind.
    pub fn matches_usage_type(self, usage_type: &str) -> bool {
        let prefix = usage_type.split(':').next().unwrap_or_default();
        prefix.ends_with(self.as_str())
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved usage dimension of a usage record: engine plus billing kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageDimension {
    pub region: String,
    pub instance_type: String,
    pub engine: Engine,
    pub kind: UsageKind,
}

/// Observed or forecasted hours for one usage dimension in one period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageQuantity {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub description: String,
    pub region: String,
    pub instance_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_option: Option<String>,
    /// Period label, usually `YYYY-MM`.
    pub date: String,
    /// Hours billed on demand.
    #[serde(default)]
    pub instance_hours: Decimal,
    /// Hours already covered by an existing reservation.
    #[serde(default)]
    pub reserved_hours: Decimal,
}

impl UsageQuantity {
    pub fn dimension(&self) -> Result<UsageDimension, InvalidUsageDimensionError> {
        let (engine, kind) = if let Some(platform) = non_empty(&self.platform) {
            (Engine::OperatingSystem(operating_system(platform).to_string()), UsageKind::BoxUsage)
        } else if let Some(cache) = non_empty(&self.cache_engine) {
            (Engine::CacheEngine(cache.to_string()), UsageKind::NodeUsage)
        } else if let Some(database) = non_empty(&self.database_engine) {
            let kind = match non_empty(&self.deployment_option) {
                Some("Single-AZ") => UsageKind::InstanceUsage,
                Some("Multi-AZ") => UsageKind::MultiAzUsage,
                _ => return Err(self.invalid_dimension()),
            };
            (Engine::DatabaseEngine(database.to_string()), kind)
        } else {
            return Err(self.invalid_dimension());
        };

        Ok(UsageDimension {
            region: self.region.clone(),
            instance_type: self.instance_type.clone(),
            engine,
            kind,
        })
    }

    /// `<REGION CODE>-<kind>:<instance type>`, the usage type the catalog
    /// publishes for this record.
    pub fn usage_type(&self) -> Result<String, InvalidUsageDimensionError> {
        let dimension = self.dimension()?;
        Ok(match region_code(&self.region) {
            Some(code) => format!("{code}-{}:{}", dimension.kind, self.instance_type),
            None => format!("{}:{}", dimension.kind, self.instance_type),
        })
    }

    pub fn engine_label(&self) -> Result<String, InvalidUsageDimensionError> {
        Ok(self.dimension()?.engine.label().to_string())
    }

    pub fn total_hours(&self) -> Decimal {
        self.instance_hours + self.reserved_hours
    }

    /// Month bucket of the period label; labels that are not dates stand
    /// for themselves.
    pub fn period(&self) -> String {
        normalize_period(&self.date)
    }

    fn invalid_dimension(&self) -> InvalidUsageDimensionError {
        InvalidUsageDimensionError {
            account_id: self.account_id.clone(),
            region: self.region.clone(),
            instance_type: self.instance_type.clone(),
            period: self.date.clone(),
        }
    }
}

/// One point of a monthly demand projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forecast {
    pub month: String,
    pub instance_num: Decimal,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

pub fn normalize_period(label: &str) -> String {
    let label = label.trim();
    let parsed = NaiveDate::parse_from_str(label, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{label}-01"), "%Y-%m-%d"));
    match parsed {
        Ok(date) => date.format("%Y-%m").to_string(),
        Err(_) => label.to_string(),
    }
}

/// Catalog operating system name for a billing platform name.
pub fn operating_system(platform: &str) -> &str {
    match platform {
        "Linux/UNIX" | "Linux/UNIX (Amazon VPC)" => "Linux",
        "Red Hat Enterprise Linux" | "Red Hat Enterprise Linux (Amazon VPC)" => "RHEL",
        "SUSE Linux" | "SUSE Linux (Amazon VPC)" => "SUSE",
        "Windows" | "Windows (Amazon VPC)" => "Windows",
        "Windows with SQL Server Standard" => "Windows with SQL Server Standard",
        "Windows with SQL Server Web" => "Windows with SQL Server Web",
        "Windows with SQL Server Enterprise" => "Windows with SQL Server Enterprise",
        other => other,
    }
}

pub fn region_code(region: &str) -> Option<&'static str> {
    let code = match region {
        "us-east-1" => "USE1",
        "us-east-2" => "USE2",
        "us-west-1" => "USW1",
        "us-west-2" => "USW2",
        "ca-central-1" => "CAN1",
        "eu-central-1" => "EUC1",
        "eu-west-1" => "EU",
        "eu-west-2" => "EUW2",
        "eu-west-3" => "EUW3",
        "eu-north-1" => "EUN1",
        "ap-northeast-1" => "APN1",
        "ap-northeast-2" => "APN2",
        "ap-northeast-3" => "APN3",
        "ap-southeast-1" => "APS1",
        "ap-southeast-2" => "APS2",
        "ap-south-1" => "APS3",
        "sa-east-1" => "SAE1",
        _ => return None,
    };
    Some(code)
}
