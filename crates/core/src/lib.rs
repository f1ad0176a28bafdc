pub mod catalog;
pub mod config;
pub mod cost;
pub mod domain;
pub mod errors;
pub mod recommend;

pub use catalog::{OfferFilter, OfferSet, PricingCatalog};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use cost::{CostProjection, InstanceNum, ReservedAppliedCost};
pub use domain::offer::{
    Engine, LeaseContractLength, OfferingClass, PriceOffer, PurchaseOption, Sku,
};
pub use domain::recommendation::{
    ModelingAnomaly, RecommendationRecord, Recommended, UsageSummary,
};
pub use domain::usage::{Forecast, UsageDimension, UsageKind, UsageQuantity};
pub use errors::{CatalogError, InvalidUsageDimensionError, RecommendError};
pub use recommend::{
    OfferSeed, PurchaseRequest, RecommendDefaults, RecommendFailure, RecommendationEngine,
    RecommendationReport,
};
