use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::offer::{Engine, LeaseContractLength, OfferingClass, PriceOffer, PurchaseOption};
use crate::domain::usage::UsageKind;

/// One field-equality predicate over catalog offers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferFilter {
    Region(String),
    OperatingSystem(String),
    Tenancy(String),
    PreInstalled(String),
    OfferingClass(OfferingClass),
    LeaseContractLength(LeaseContractLength),
    /// Cache or database engine.
    Engine(String),
    PurchaseOption(PurchaseOption),
    UsageKind(UsageKind),
}

impl OfferFilter {
    pub fn matches(&self, offer: &PriceOffer) -> bool {
        match self {
            Self::Region(region) => &offer.region == region,
            Self::OperatingSystem(os) => {
                matches!(&offer.engine, Engine::OperatingSystem(value) if value == os)
            }
            Self::Tenancy(tenancy) => &offer.tenancy == tenancy,
            Self::PreInstalled(pre_installed) => &offer.pre_installed == pre_installed,
            Self::OfferingClass(class) => offer.offering_class == *class,
            Self::LeaseContractLength(length) => offer.lease_contract_length == *length,
            Self::Engine(engine) => matches!(
                &offer.engine,
                Engine::CacheEngine(value) | Engine::DatabaseEngine(value) if value == engine
            ),
            Self::PurchaseOption(option) => offer.purchase_option == *option,
            Self::UsageKind(kind) => kind.matches_usage_type(&offer.usage_type),
        }
    }

    /// Filter that holds an offer's engine dimension fixed.
    pub fn for_engine(engine: &Engine) -> Self {
        match engine {
            Engine::OperatingSystem(os) => Self::OperatingSystem(os.clone()),
            Engine::CacheEngine(value) | Engine::DatabaseEngine(value) => {
                Self::Engine(value.clone())
            }
        }
    }
}

/// Ordered offers shared with the catalog. Narrowing returns a new set and
/// keeps catalog load order, so chains of filters commute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OfferSet {
    offers: Vec<Arc<PriceOffer>>,
}

impl OfferSet {
    pub fn new(offers: Vec<Arc<PriceOffer>>) -> Self {
        Self { offers }
    }

    pub fn narrow(&self, predicate: impl Fn(&PriceOffer) -> bool) -> Self {
        Self {
            offers: self.offers.iter().filter(|offer| predicate(offer)).cloned().collect(),
        }
    }

    pub fn filter(&self, filter: &OfferFilter) -> Self {
        self.narrow(|offer| filter.matches(offer))
    }

    pub fn filter_all<'a>(&self, filters: impl IntoIterator<Item = &'a OfferFilter>) -> Self {
        let filters: Vec<&OfferFilter> = filters.into_iter().collect();
        self.narrow(|offer| filters.iter().all(|filter| filter.matches(offer)))
    }

    pub fn region(&self, region: &str) -> Self {
        self.filter(&OfferFilter::Region(region.to_string()))
    }

    pub fn operating_system(&self, os: &str) -> Self {
        self.filter(&OfferFilter::OperatingSystem(os.to_string()))
    }

    pub fn tenancy(&self, tenancy: &str) -> Self {
        self.filter(&OfferFilter::Tenancy(tenancy.to_string()))
    }

    pub fn pre_installed(&self, pre_installed: &str) -> Self {
        self.filter(&OfferFilter::PreInstalled(pre_installed.to_string()))
    }

    pub fn offering_class(&self, class: OfferingClass) -> Self {
        self.filter(&OfferFilter::OfferingClass(class))
    }

    pub fn lease_contract_length(&self, length: LeaseContractLength) -> Self {
        self.filter(&OfferFilter::LeaseContractLength(length))
    }

    pub fn engine(&self, engine: &str) -> Self {
        self.filter(&OfferFilter::Engine(engine.to_string()))
    }

    pub fn purchase_option(&self, option: PurchaseOption) -> Self {
        self.filter(&OfferFilter::PurchaseOption(option))
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PriceOffer>> {
        self.offers.iter()
    }

    pub fn first(&self) -> Option<&Arc<PriceOffer>> {
        self.offers.first()
    }

    pub fn as_slice(&self) -> &[Arc<PriceOffer>] {
        &self.offers
    }
}

impl<'a> IntoIterator for &'a OfferSet {
    type Item = &'a Arc<PriceOffer>;
    type IntoIter = std::slice::Iter<'a, Arc<PriceOffer>>;

    fn into_iter(self) -> Self::IntoIter {
        self.offers.iter()
    }
}
