use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cost::CostProjection;
use crate::domain::offer::PriceOffer;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_hours: Decimal,
    pub on_demand_hours: Decimal,
    pub reserved_hours: Decimal,
    /// Distinct periods observed.
    pub horizon_months: u32,
    pub on_demand_instance_num: u32,
    pub reserved_instance_num: u32,
}

/// Pricing-data inconsistency found while modeling a recommendation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelingAnomaly {
    NegativeSavings { savings: Decimal },
    NoBreakeven { term_months: u32 },
}

impl ModelingAnomaly {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NegativeSavings { .. } => "negative_savings",
            Self::NoBreakeven { .. } => "no_breakeven",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommended {
    pub offer: PriceOffer,
    pub usage: UsageSummary,
    pub cost: CostProjection,
    pub breakeven_month: Option<u32>,
    /// False when no offer pays for itself within the observed horizon; the
    /// cost then describes running everything on demand.
    pub reservation_worthy: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<ModelingAnomaly>,
}

/// Flat row handed to the report layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub usage_type: String,
    pub lease_contract_length: String,
    pub purchase_option: String,
    pub os_engine: String,
    pub total_hours: Decimal,
    pub on_demand_hours: Decimal,
    pub reserved_hours: Decimal,
    pub reserved_instance_num: u32,
    pub full_on_demand_cost: Decimal,
    pub reserved_applied_cost: Decimal,
    pub saving_cost: Decimal,
    pub discount_rate: Decimal,
    pub breakeven_month: Option<u32>,
    pub reservation_worthy: bool,
    pub anomalies: usize,
}

impl Recommended {
    pub fn record(&self) -> RecommendationRecord {
        RecommendationRecord {
            usage_type: self.offer.usage_type.clone(),
            lease_contract_length: self.offer.lease_contract_length.as_str().to_string(),
            purchase_option: self.offer.purchase_option.as_str().to_string(),
            os_engine: self.offer.engine_label().to_string(),
            total_hours: self.usage.total_hours,
            on_demand_hours: self.usage.on_demand_hours,
            reserved_hours: self.usage.reserved_hours,
            reserved_instance_num: self.usage.reserved_instance_num,
            full_on_demand_cost: self.cost.full_on_demand,
            reserved_applied_cost: self.cost.reserved_applied.total,
            saving_cost: self.cost.savings,
            discount_rate: self.cost.discount_rate,
            breakeven_month: self.breakeven_month,
            reservation_worthy: self.reservation_worthy,
            anomalies: self.anomalies.len(),
        }
    }
}
