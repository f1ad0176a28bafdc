//! Financial model for a single reservation offer.
//!
//! All amounts are [`Decimal`] so that catalog prices multiply out to the
//! cent without drift: `0.129 * 8760 * 5` is exactly `5650.2`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::offer::PriceOffer;
use crate::domain::usage::Forecast;

pub const HOURS_PER_YEAR: u32 = 8760;
pub const MONTHS_PER_YEAR: u32 = 12;
pub const HOURS_PER_MONTH: u32 = HOURS_PER_YEAR / MONTHS_PER_YEAR;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedAppliedCost {
    /// Instances not covered by the reservation, billed on demand.
    pub on_demand: Decimal,
    /// Upfront commitment plus recurring reserved charge.
    pub reserved: Decimal,
    pub total: Decimal,
}

/// Cost of one offer over its full lease term for an on-demand/reserved split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostProjection {
    pub full_on_demand: Decimal,
    pub reserved_applied: ReservedAppliedCost,
    pub savings: Decimal,
    pub discount_rate: Decimal,
}

/// Mean forecast demand attributed to on-demand and reserved coverage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceNum {
    pub on_demand_instance_num: Decimal,
    pub reserved_instance_num: Decimal,
}

impl PriceOffer {
    pub fn term_months(&self) -> u32 {
        MONTHS_PER_YEAR * self.lease_contract_length.years()
    }

    pub fn term_hours(&self) -> Decimal {
        Decimal::from(HOURS_PER_YEAR * self.lease_contract_length.years())
    }

    /// Full-term cost for `on_demand_count` on-demand and `reserved_count`
    /// reserved instances. `None` when an amount overflows [`Decimal`].
    pub fn expected_cost(
        &self,
        on_demand_count: u32,
        reserved_count: u32,
    ) -> Option<CostProjection> {
        let term_hours = self.term_hours();
        let on_demand_count = Decimal::from(on_demand_count);
        let reserved_count = Decimal::from(reserved_count);
        let on_demand_term = self.on_demand.checked_mul(term_hours)?;

        let full_on_demand = on_demand_term.checked_mul(on_demand_count + reserved_count)?;
        let on_demand = on_demand_term.checked_mul(on_demand_count)?;
        let recurring = self.reserved_hourly.checked_mul(term_hours)?.checked_mul(reserved_count)?;
        let reserved = self.upfront.checked_mul(reserved_count)?.checked_add(recurring)?;
        let total = on_demand.checked_add(reserved)?;
        let savings = full_on_demand.checked_sub(total)?;
        let discount_rate = if full_on_demand.is_zero() {
            Decimal::ZERO
        } else {
            savings.checked_div(full_on_demand)?
        };

        Some(CostProjection {
            full_on_demand: full_on_demand.normalize(),
            reserved_applied: ReservedAppliedCost {
                on_demand: on_demand.normalize(),
                reserved: reserved.normalize(),
                total: total.normalize(),
            },
            savings: savings.normalize(),
            discount_rate: discount_rate.normalize(),
        })
    }

    /// First month in which the cumulative reserved cost of one instance is
    /// no greater than running it on demand. `None` when the reservation never
    /// catches up within the lease term.
    pub fn breakeven_point_in_month(&self) -> Option<u32> {
        let hours_per_month = self.term_hours() / Decimal::from(self.term_months());
        (1..=self.term_months()).find(|month| {
            let elapsed = hours_per_month * Decimal::from(*month);
            let reserved = self
                .reserved_hourly
                .checked_mul(elapsed)
                .and_then(|recurring| recurring.checked_add(self.upfront));
            match (reserved, self.on_demand.checked_mul(elapsed)) {
                (Some(reserved), Some(on_demand)) => reserved <= on_demand,
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
    }

    /// Reserved instances already committed under this offer, expressed as
    /// whole-term instance equivalents.
    pub fn committed_instance_num(&self) -> Decimal {
        if self.reserved_hours.is_zero() {
            return Decimal::ZERO;
        }
        self.reserved_hours / self.term_hours()
    }

    /// Mean forecast demand split against the existing commitment. `None`
    /// when the forecast total overflows [`Decimal`].
    pub fn expected_instance_num(&self, forecast: &[Forecast]) -> Option<InstanceNum> {
        if forecast.is_empty() {
            return Some(InstanceNum {
                on_demand_instance_num: Decimal::ZERO,
                reserved_instance_num: Decimal::ZERO,
            });
        }

        let sum = forecast
            .iter()
            .try_fold(Decimal::ZERO, |sum, entry| sum.checked_add(entry.instance_num))?;
        let mean = sum / Decimal::from(forecast.len());
        let reserved = mean.min(self.committed_instance_num());

        Some(InstanceNum {
            on_demand_instance_num: (mean - reserved).normalize(),
            reserved_instance_num: reserved.normalize(),
        })
    }
}
