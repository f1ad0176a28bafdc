//! Reservation purchase recommendation.
//!
//! For one usage dimension the engine enumerates the catalog offers that
//! differ only by lease length and purchase option, prices each against the
//! observed on-demand/reserved split, drops the ones that do not break even
//! inside the observed horizon, and keeps the cheapest.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{OfferFilter, PricingCatalog};
use crate::config::RecommendConfig;
use crate::cost::{CostProjection, HOURS_PER_MONTH};
use crate::domain::offer::{Engine, OfferingClass, PriceOffer};
use crate::domain::recommendation::{ModelingAnomaly, Recommended, UsageSummary};
use crate::domain::usage::{UsageDimension, UsageQuantity};
use crate::errors::RecommendError;

/// Where candidate offers come from: a concrete offer, or an instance type
/// resolved against the usage dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferSeed {
    Offer(PriceOffer),
    InstanceType(String),
}

/// One purchase question: a priced offer and the usage it should cover.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub price: PriceOffer,
    pub quantity: Vec<UsageQuantity>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendFailure {
    /// Offer SKU or usage type the failure belongs to.
    pub subject: String,
    pub error: RecommendError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecommendationReport {
    pub recommended: Vec<Recommended>,
    pub errors: Vec<RecommendFailure>,
}

/// Seed-resolution defaults for instance-type lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendDefaults {
    pub tenancy: String,
    pub pre_installed: String,
    pub offering_class: OfferingClass,
}

impl Default for RecommendDefaults {
    fn default() -> Self {
        Self {
            tenancy: "Shared".to_string(),
            pre_installed: "NA".to_string(),
            offering_class: OfferingClass::Standard,
        }
    }
}

impl From<&RecommendConfig> for RecommendDefaults {
    fn from(config: &RecommendConfig) -> Self {
        Self {
            tenancy: config.default_tenancy.clone(),
            pre_installed: config.default_pre_installed.clone(),
            offering_class: config.default_offering_class,
        }
    }
}

struct Evaluation {
    offer: Arc<PriceOffer>,
    cost: CostProjection,
    breakeven: Option<u32>,
}

struct ObservedSplit {
    summary: UsageSummary,
    on_demand_count: u32,
    reserved_count: u32,
}

pub struct RecommendationEngine {
    catalog: Arc<PricingCatalog>,
    defaults: RecommendDefaults,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<PricingCatalog>) -> Self {
        Self::with_defaults(catalog, RecommendDefaults::default())
    }

    pub fn with_defaults(catalog: Arc<PricingCatalog>, defaults: RecommendDefaults) -> Self {
        Self { catalog, defaults }
    }

    pub fn recommend(
        &self,
        usage: &[UsageQuantity],
        seed: &OfferSeed,
    ) -> Result<Recommended, RecommendError> {
        let dimension = common_dimension(usage)?;
        let candidates = self.candidates(&dimension, seed)?;
        let observed = observe(usage)?;

        let evaluations = candidates
            .into_iter()
            .map(|offer| {
                let cost = priced(&offer, observed.on_demand_count, observed.reserved_count)?;
                let breakeven = offer.breakeven_point_in_month();
                Ok(Evaluation { offer, cost, breakeven })
            })
            .collect::<Result<Vec<_>, RecommendError>>()?;

        let horizon = observed.summary.horizon_months;
        let selected = evaluations
            .iter()
            .filter(|evaluation| evaluation.breakeven.is_some_and(|month| month <= horizon))
            .min_by(|left, right| by_total_then_commitment(left, right));

        debug!(
            event_name = "recommend.candidates_evaluated",
            instance_type = %dimension.instance_type,
            region = %dimension.region,
            candidates = evaluations.len(),
            horizon_months = horizon,
            "reservation candidates evaluated"
        );

        let recommended = match selected {
            Some(evaluation) => Recommended {
                offer: evaluation.offer.as_ref().clone(),
                reservation_worthy: observed.reserved_count > 0,
                breakeven_month: evaluation.breakeven,
                cost: evaluation.cost.clone(),
                anomalies: Vec::new(),
                usage: observed.summary,
            },
            None => {
                info!(
                    event_name = "recommend.not_reservation_worthy",
                    instance_type = %dimension.instance_type,
                    region = %dimension.region,
                    horizon_months = horizon,
                    "no offer breaks even within the observed horizon"
                );
                all_on_demand(&dimension, evaluations, observed)?
            }
        };

        Ok(with_anomalies(recommended))
    }

    /// Evaluate each purchase on its own; failures do not stop the batch.
    pub fn recommend_batch(&self, purchases: &[PurchaseRequest]) -> RecommendationReport {
        let mut report = RecommendationReport::default();
        for purchase in purchases {
            match self.recommend(&purchase.quantity, &OfferSeed::Offer(purchase.price.clone())) {
                Ok(recommended) => report.recommended.push(recommended),
                Err(error) => report
                    .errors
                    .push(RecommendFailure { subject: purchase.price.sku.0.clone(), error }),
            }
        }
        report
    }

    /// Group raw usage records by dimension and recommend per group. Records
    /// with no recognised dimension are reported and skipped.
    pub fn recommend_usage(&self, records: &[UsageQuantity]) -> RecommendationReport {
        let mut report = RecommendationReport::default();
        let mut groups: Vec<(UsageDimension, Vec<UsageQuantity>)> = Vec::new();

        for record in records {
            let dimension = match record.dimension() {
                Ok(dimension) => dimension,
                Err(error) => {
                    warn!(
                        event_name = "recommend.invalid_usage_dimension",
                        account_id = %error.account_id,
                        instance_type = %error.instance_type,
                        period = %error.period,
                        "usage record skipped"
                    );
                    report.errors.push(RecommendFailure {
                        subject: record.instance_type.clone(),
                        error: error.into(),
                    });
                    continue;
                }
            };

            match groups.iter_mut().find(|(existing, _)| existing == &dimension) {
                Some((_, members)) => members.push(record.clone()),
                None => groups.push((dimension, vec![record.clone()])),
            }
        }

        for (dimension, members) in groups {
            let seed = OfferSeed::InstanceType(dimension.instance_type.clone());
            match self.recommend(&members, &seed) {
                Ok(recommended) => report.recommended.push(recommended),
                Err(error) => {
                    let subject = members
                        .first()
                        .and_then(|record| record.usage_type().ok())
                        .unwrap_or(dimension.instance_type);
                    report.errors.push(RecommendFailure { subject, error });
                }
            }
        }

        report
    }

    fn candidates(
        &self,
        dimension: &UsageDimension,
        seed: &OfferSeed,
    ) -> Result<Vec<Arc<PriceOffer>>, RecommendError> {
        match seed {
            OfferSeed::Offer(offer) => {
                if !prices_dimension(offer, dimension) {
                    return Err(RecommendError::OfferDimensionMismatch {
                        sku: offer.sku.0.clone(),
                        usage_type: format!("{}:{}", dimension.kind, dimension.instance_type),
                    });
                }

                let filters = [
                    OfferFilter::Region(offer.region.clone()),
                    OfferFilter::for_engine(&offer.engine),
                    OfferFilter::Tenancy(offer.tenancy.clone()),
                    OfferFilter::PreInstalled(offer.pre_installed.clone()),
                    OfferFilter::OfferingClass(offer.offering_class),
                    OfferFilter::UsageKind(dimension.kind),
                ];
                let mut candidates =
                    self.catalog.query(&offer.instance_type, &filters).as_slice().to_vec();
                if !candidates.iter().any(|candidate| candidate.as_ref() == offer) {
                    candidates.push(Arc::new(offer.clone()));
                }
                Ok(candidates)
            }
            OfferSeed::InstanceType(instance_type) => {
                let mut filters = vec![
                    OfferFilter::Region(dimension.region.clone()),
                    OfferFilter::for_engine(&dimension.engine),
                    OfferFilter::OfferingClass(self.defaults.offering_class),
                    OfferFilter::UsageKind(dimension.kind),
                ];
                if matches!(dimension.engine, Engine::OperatingSystem(_)) {
                    filters.push(OfferFilter::Tenancy(self.defaults.tenancy.clone()));
                    filters.push(OfferFilter::PreInstalled(self.defaults.pre_installed.clone()));
                }

                let candidates = self.catalog.query(instance_type, &filters);
                if candidates.is_empty() {
                    return Err(RecommendError::NoCandidateOffers {
                        instance_type: instance_type.clone(),
                        region: dimension.region.clone(),
                    });
                }
                Ok(candidates.as_slice().to_vec())
            }
        }
    }
}

fn common_dimension(usage: &[UsageQuantity]) -> Result<UsageDimension, RecommendError> {
    let (first, rest) = usage.split_first().ok_or(RecommendError::EmptyUsage)?;
    let dimension = first.dimension()?;
    for record in rest {
        if record.dimension()? != dimension {
            return Err(RecommendError::MixedUsageDimensions);
        }
    }
    Ok(dimension)
}

/// Whether `offer` prices the usage dimension: same instance type, region,
/// engine and usage kind.
fn prices_dimension(offer: &PriceOffer, dimension: &UsageDimension) -> bool {
    offer.instance_type == dimension.instance_type
        && offer.region == dimension.region
        && OfferFilter::for_engine(&dimension.engine).matches(offer)
        && dimension.kind.matches_usage_type(&offer.usage_type)
}

fn priced(
    offer: &PriceOffer,
    on_demand_count: u32,
    reserved_count: u32,
) -> Result<CostProjection, RecommendError> {
    offer
        .expected_cost(on_demand_count, reserved_count)
        .ok_or_else(|| RecommendError::CostOutOfRange { sku: offer.sku.0.clone() })
}

/// Totals, horizon and the instance split implied by observed usage. The
/// reserved count is the always-on on-demand baseline (floor of the smallest
/// monthly instance equivalent); the rest of the mean demand stays on demand.
fn observe(usage: &[UsageQuantity]) -> Result<ObservedSplit, RecommendError> {
    let mut per_period: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut on_demand_hours = Decimal::ZERO;
    let mut reserved_hours = Decimal::ZERO;

    for record in usage {
        let period = record.period();
        if record.instance_hours.is_sign_negative() || record.reserved_hours.is_sign_negative() {
            return Err(RecommendError::UsageOutOfRange { period, reason: "negative hours" });
        }

        let overflow = || RecommendError::UsageOutOfRange {
            period: period.clone(),
            reason: "hour total overflows",
        };
        on_demand_hours = on_demand_hours.checked_add(record.instance_hours).ok_or_else(overflow)?;
        reserved_hours = reserved_hours.checked_add(record.reserved_hours).ok_or_else(overflow)?;
        let bucket = per_period.entry(period.clone()).or_default();
        *bucket = bucket.checked_add(record.instance_hours).ok_or_else(overflow)?;
    }
    let total_hours = on_demand_hours.checked_add(reserved_hours).ok_or_else(|| {
        RecommendError::UsageOutOfRange {
            period: "total".to_string(),
            reason: "hour total overflows",
        }
    })?;

    let hours_per_month = Decimal::from(HOURS_PER_MONTH);
    let instances: Vec<(&String, Decimal)> =
        per_period.iter().map(|(period, hours)| (period, hours / hours_per_month)).collect();
    let horizon_months = u32::try_from(instances.len()).map_err(|_| {
        RecommendError::UsageOutOfRange { period: "total".to_string(), reason: "too many periods" }
    })?;

    let (reserved_count, on_demand_count) =
        match instances.iter().min_by(|left, right| left.1.cmp(&right.1)) {
            Some((minimum_period, minimum)) => {
                let mut sum = Decimal::ZERO;
                for (period, count) in &instances {
                    sum = sum.checked_add(*count).ok_or_else(|| RecommendError::UsageOutOfRange {
                        period: period.to_string(),
                        reason: "instance total overflows",
                    })?;
                }
                let mean = sum / Decimal::from(instances.len());
                let reserved = instance_count(minimum.floor(), minimum_period)?;
                let demand = instance_count(mean.ceil(), minimum_period)?;
                (reserved, demand.saturating_sub(reserved))
            }
            None => (0, 0),
        };

    Ok(ObservedSplit {
        summary: UsageSummary {
            total_hours: total_hours.normalize(),
            on_demand_hours: on_demand_hours.normalize(),
            reserved_hours: reserved_hours.normalize(),
            horizon_months,
            on_demand_instance_num: on_demand_count,
            reserved_instance_num: reserved_count,
        },
        on_demand_count,
        reserved_count,
    })
}

fn instance_count(count: Decimal, period: &str) -> Result<u32, RecommendError> {
    count.to_u32().ok_or_else(|| RecommendError::UsageOutOfRange {
        period: period.to_string(),
        reason: "instance count exceeds u32",
    })
}

/// Cheapest total first; ties go to the smaller upfront commitment.
fn by_total_then_commitment(left: &Evaluation, right: &Evaluation) -> Ordering {
    left.cost
        .reserved_applied
        .total
        .cmp(&right.cost.reserved_applied.total)
        .then_with(|| upfront_rank(left).cmp(&upfront_rank(right)))
        .then_with(|| left.offer.upfront.cmp(&right.offer.upfront))
}

fn upfront_rank(evaluation: &Evaluation) -> u8 {
    evaluation.offer.purchase_option.upfront_rank()
}

fn all_on_demand(
    dimension: &UsageDimension,
    evaluations: Vec<Evaluation>,
    observed: ObservedSplit,
) -> Result<Recommended, RecommendError> {
    let instances = observed.on_demand_count + observed.reserved_count;
    let fallback = evaluations
        .into_iter()
        .map(|evaluation| {
            let cost = priced(&evaluation.offer, instances, 0)?;
            Ok(Evaluation { cost, ..evaluation })
        })
        .collect::<Result<Vec<_>, RecommendError>>()?
        .into_iter()
        .min_by(by_total_then_commitment);

    let Some(evaluation) = fallback else {
        return Err(RecommendError::NoCandidateOffers {
            instance_type: dimension.instance_type.clone(),
            region: dimension.region.clone(),
        });
    };

    Ok(Recommended {
        offer: evaluation.offer.as_ref().clone(),
        usage: UsageSummary {
            on_demand_instance_num: instances,
            reserved_instance_num: 0,
            ..observed.summary
        },
        cost: evaluation.cost,
        breakeven_month: evaluation.breakeven,
        reservation_worthy: false,
        anomalies: Vec::new(),
    })
}

fn with_anomalies(mut recommended: Recommended) -> Recommended {
    if recommended.breakeven_month.is_none() {
        recommended
            .anomalies
            .push(ModelingAnomaly::NoBreakeven { term_months: recommended.offer.term_months() });
    }
    // Survivors of the horizon filter never lose money over the term unless
    // the catalog carries inconsistent prices such as a negative upfront.
    if recommended.cost.savings < Decimal::ZERO {
        recommended
            .anomalies
            .push(ModelingAnomaly::NegativeSavings { savings: recommended.cost.savings });
    }

    for anomaly in &recommended.anomalies {
        warn!(
            event_name = "recommend.modeling_anomaly",
            anomaly = anomaly.as_str(),
            sku = %recommended.offer.sku.0,
            usage_type = %recommended.offer.usage_type,
            "pricing data produced a modeling anomaly"
        );
    }
    recommended
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{OfferSeed, PurchaseRequest, RecommendationEngine};
    use crate::catalog::PricingCatalog;
    use crate::domain::offer::{
        Engine, LeaseContractLength, OfferingClass, PriceOffer, PurchaseOption, Sku,
    };
    use crate::domain::recommendation::ModelingAnomaly;
    use crate::domain::usage::UsageQuantity;
    use crate::errors::RecommendError;

    fn offer(
        sku: &str,
        lease: LeaseContractLength,
        option: PurchaseOption,
        reserved_hourly: Decimal,
        upfront: Decimal,
    ) -> PriceOffer {
        PriceOffer {
            sku: Sku(sku.to_string()),
            offer_term_code: "4NA7Y494T4".to_string(),
            region: "ap-northeast-1".to_string(),
            instance_type: "m4.large".to_string(),
            usage_type: "APN1-BoxUsage:m4.large".to_string(),
            operation: "RunInstances".to_string(),
            lease_contract_length: lease,
            purchase_option: option,
            offering_class: OfferingClass::Standard,
            tenancy: "Shared".to_string(),
            pre_installed: "NA".to_string(),
            engine: Engine::OperatingSystem("Linux".to_string()),
            normalization_size_factor: Some(Decimal::from(4)),
            on_demand: Decimal::new(129, 3),
            reserved_hourly,
            upfront,
            reserved_hours: Decimal::ZERO,
        }
    }

    fn m4_large_offers() -> Vec<PriceOffer> {
        use LeaseContractLength::{OneYear, ThreeYears};
        use PurchaseOption::{AllUpfront, NoUpfront, PartialUpfront};

        vec![
            offer("1Y-NU", OneYear, NoUpfront, Decimal::new(88, 3), Decimal::ZERO),
            offer("1Y-PU", OneYear, PartialUpfront, Decimal::new(42, 3), Decimal::from(364)),
            offer("1Y-AU", OneYear, AllUpfront, Decimal::ZERO, Decimal::from(713)),
            offer("3Y-NU", ThreeYears, NoUpfront, Decimal::new(61, 3), Decimal::ZERO),
            offer("3Y-PU", ThreeYears, PartialUpfront, Decimal::new(28, 3), Decimal::from(749)),
            offer("3Y-AU", ThreeYears, AllUpfront, Decimal::ZERO, Decimal::from(1468)),
        ]
    }

    fn engine(offers: Vec<PriceOffer>) -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(PricingCatalog::new(offers)))
    }

    fn usage(month: &str, instance_hours: i64) -> UsageQuantity {
        UsageQuantity {
            account_id: "123456789012".to_string(),
            description: String::new(),
            region: "ap-northeast-1".to_string(),
            instance_type: "m4.large".to_string(),
            platform: Some("Linux/UNIX".to_string()),
            cache_engine: None,
            database_engine: None,
            deployment_option: None,
            date: month.to_string(),
            instance_hours: Decimal::from(instance_hours),
            reserved_hours: Decimal::ZERO,
        }
    }

    fn steady_year(instance_hours: i64) -> Vec<UsageQuantity> {
        (1..=12).map(|month| usage(&format!("2018-{month:02}"), instance_hours)).collect()
    }

    fn seed() -> OfferSeed {
        OfferSeed::InstanceType("m4.large".to_string())
    }

    #[test]
    fn steady_year_of_demand_selects_cheapest_surviving_offer() {
        let recommended =
            engine(m4_large_offers()).recommend(&steady_year(1460), &seed()).expect("recommend");

        assert_eq!(recommended.offer.sku, Sku("1Y-AU".to_string()));
        assert!(recommended.reservation_worthy);
        assert_eq!(recommended.breakeven_month, Some(8));
        assert_eq!(recommended.usage.horizon_months, 12);
        assert_eq!(recommended.usage.reserved_instance_num, 2);
        assert_eq!(recommended.usage.on_demand_instance_num, 0);
        assert_eq!(recommended.cost.full_on_demand, Decimal::new(226008, 2));
        assert_eq!(recommended.cost.reserved_applied.total, Decimal::from(1426));
        assert_eq!(recommended.cost.savings, Decimal::new(83408, 2));
        assert!(recommended.anomalies.is_empty());
    }

    #[test]
    fn short_horizon_drops_late_breakeven_offers() {
        let usage: Vec<_> =
            ["2018-01", "2018-02", "2018-03"].iter().map(|month| usage(month, 1460)).collect();

        let recommended = engine(m4_large_offers()).recommend(&usage, &seed()).expect("recommend");

        assert_eq!(recommended.offer.sku, Sku("1Y-NU".to_string()));
        assert_eq!(recommended.breakeven_month, Some(1));
        assert_eq!(recommended.cost.reserved_applied.total, Decimal::new(154176, 2));
    }

    #[test]
    fn records_in_one_month_are_summed_into_one_period() {
        let usage = vec![usage("2018-01-01", 730), usage("2018-01-15", 730)];

        let recommended = engine(m4_large_offers()).recommend(&usage, &seed()).expect("recommend");

        assert_eq!(recommended.usage.horizon_months, 1);
        assert_eq!(recommended.usage.reserved_instance_num, 2);
        assert_eq!(recommended.usage.total_hours, Decimal::from(1460));
    }

    #[test]
    fn uneven_demand_without_baseline_is_not_reservation_worthy() {
        let usage = vec![usage("2018-01", 1460), usage("2018-02", 100)];

        let recommended = engine(m4_large_offers()).recommend(&usage, &seed()).expect("recommend");

        assert!(!recommended.reservation_worthy);
        assert_eq!(recommended.usage.reserved_instance_num, 0);
        assert_eq!(recommended.usage.on_demand_instance_num, 2);
        assert_eq!(recommended.cost.savings, Decimal::ZERO);
    }

    #[test]
    fn no_survivor_falls_back_to_all_on_demand() {
        let all_upfront = offer(
            "1Y-AU",
            LeaseContractLength::OneYear,
            PurchaseOption::AllUpfront,
            Decimal::ZERO,
            Decimal::from(713),
        );

        let recommended = engine(vec![all_upfront])
            .recommend(&[usage("2018-01", 1460)], &seed())
            .expect("recommend");

        assert!(!recommended.reservation_worthy);
        assert_eq!(recommended.breakeven_month, Some(8));
        assert_eq!(recommended.usage.reserved_instance_num, 0);
        assert_eq!(recommended.usage.on_demand_instance_num, 2);
        assert_eq!(recommended.cost.reserved_applied.total, Decimal::new(226008, 2));
        assert_eq!(recommended.cost.savings, Decimal::ZERO);
    }

    #[test]
    fn offer_that_never_breaks_even_is_flagged() {
        let broken = offer(
            "BROKEN",
            LeaseContractLength::OneYear,
            PurchaseOption::NoUpfront,
            Decimal::new(200, 3),
            Decimal::ZERO,
        );

        let recommended = engine(Vec::new())
            .recommend(&steady_year(730), &OfferSeed::Offer(broken))
            .expect("recommend");

        assert!(!recommended.reservation_worthy);
        assert_eq!(recommended.breakeven_month, None);
        assert_eq!(recommended.anomalies, vec![ModelingAnomaly::NoBreakeven { term_months: 12 }]);
    }

    #[test]
    fn offer_seed_compares_against_sibling_offers() {
        let mut offers = m4_large_offers();
        let seed = offers.remove(0);
        let mut catalog_offers = m4_large_offers();
        catalog_offers.push(PriceOffer {
            sku: Sku("DEDICATED".to_string()),
            tenancy: "Dedicated".to_string(),
            upfront: Decimal::ZERO,
            reserved_hourly: Decimal::ZERO,
            ..seed.clone()
        });

        let recommended = engine(catalog_offers)
            .recommend(&steady_year(1460), &OfferSeed::Offer(seed))
            .expect("recommend");

        assert_eq!(recommended.offer.sku, Sku("1Y-AU".to_string()));
    }

    #[test]
    fn empty_and_mixed_usage_are_rejected() {
        let engine = engine(m4_large_offers());
        assert_eq!(engine.recommend(&[], &seed()), Err(RecommendError::EmptyUsage));

        let mut mixed = steady_year(730);
        mixed[3].platform = Some("Windows".to_string());
        assert_eq!(engine.recommend(&mixed, &seed()), Err(RecommendError::MixedUsageDimensions));
    }

    #[test]
    fn unknown_instance_type_has_no_candidates() {
        let usage =
            vec![UsageQuantity { instance_type: "x9.huge".to_string(), ..usage("2018-01", 730) }];
        let seed = OfferSeed::InstanceType("x9.huge".to_string());

        let error = engine(m4_large_offers()).recommend(&usage, &seed).expect_err("no offers");
        assert_eq!(error.class(), "no_candidate_offers");
    }

    #[test]
    fn batch_collects_failures_without_stopping() {
        let offers = m4_large_offers();
        let purchases = vec![
            PurchaseRequest { price: offers[0].clone(), quantity: steady_year(1460) },
            PurchaseRequest { price: offers[1].clone(), quantity: Vec::new() },
        ];

        let report = engine(offers).recommend_batch(&purchases);

        assert_eq!(report.recommended.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].subject, "1Y-PU");
        assert_eq!(report.errors[0].error, RecommendError::EmptyUsage);
    }

    #[test]
    fn usage_records_are_grouped_by_dimension() {
        let mut records = steady_year(1460);
        records.push(UsageQuantity { platform: None, ..usage("2018-01", 730) });
        records
            .push(UsageQuantity { instance_type: "c4.large".to_string(), ..usage("2018-01", 730) });

        let report = engine(m4_large_offers()).recommend_usage(&records);

        assert_eq!(report.recommended.len(), 1);
        assert_eq!(report.recommended[0].usage.horizon_months, 12);
        let classes: Vec<&str> =
            report.errors.iter().map(|failure| failure.error.class()).collect();
        assert_eq!(classes, vec!["invalid_usage_dimension", "no_candidate_offers"]);
        assert_eq!(report.errors[1].subject, "APN1-BoxUsage:c4.large");
    }

    #[test]
    fn offer_seed_must_price_the_usage_dimension() {
        let seed = m4_large_offers().remove(2);
        let foreign: Vec<UsageQuantity> = steady_year(1460)
            .into_iter()
            .map(|record| UsageQuantity {
                region: "us-east-1".to_string(),
                instance_type: "c5.xlarge".to_string(),
                platform: Some("Windows".to_string()),
                ..record
            })
            .collect();

        let error = engine(m4_large_offers())
            .recommend(&foreign, &OfferSeed::Offer(seed))
            .expect_err("offer for another dimension");
        assert_eq!(
            error,
            RecommendError::OfferDimensionMismatch {
                sku: "1Y-AU".to_string(),
                usage_type: "BoxUsage:c5.xlarge".to_string(),
            }
        );
    }

    #[test]
    fn negative_hours_are_rejected() {
        let mut usage = steady_year(730);
        usage[4].instance_hours = Decimal::from(-730);

        let error = engine(m4_large_offers()).recommend(&usage, &seed()).expect_err("negative");
        assert_eq!(
            error,
            RecommendError::UsageOutOfRange {
                period: "2018-05".to_string(),
                reason: "negative hours",
            }
        );
    }

    #[test]
    fn oversized_usage_is_an_error_not_a_panic() {
        let mut overflowing = vec![usage("2018-01", 0), usage("2018-02", 0)];
        for record in &mut overflowing {
            record.instance_hours = Decimal::MAX;
        }
        let engine = engine(m4_large_offers());

        let error = engine.recommend(&overflowing, &seed()).expect_err("overflowing hours");
        assert_eq!(error.class(), "usage_out_of_range");

        let huge = vec![usage("2018-01", 7_300_000_000_000)];
        let error = engine.recommend(&huge, &seed()).expect_err("count beyond u32");
        assert_eq!(
            error,
            RecommendError::UsageOutOfRange {
                period: "2018-01".to_string(),
                reason: "instance count exceeds u32",
            }
        );
    }

    #[test]
    fn inconsistent_prices_surface_negative_savings() {
        let rebate = offer(
            "REBATE",
            LeaseContractLength::OneYear,
            PurchaseOption::NoUpfront,
            Decimal::new(200, 3),
            Decimal::from(-100),
        );

        let recommended = engine(Vec::new())
            .recommend(&steady_year(730), &OfferSeed::Offer(rebate))
            .expect("recommend");

        assert!(recommended.reservation_worthy);
        assert_eq!(recommended.breakeven_month, Some(1));
        assert_eq!(recommended.cost.savings, Decimal::new(-52196, 2));
        assert_eq!(
            recommended.anomalies,
            vec![ModelingAnomaly::NegativeSavings { savings: Decimal::new(-52196, 2) }]
        );
    }
}
