use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog snapshot `{path}` was not found")]
    NotFound { path: PathBuf },
    #[error("could not read catalog snapshot `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog snapshot `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("catalog snapshot `{path}` lists offer `{sku}` term `{offer_term_code}` twice")]
    DuplicateOffer { path: PathBuf, sku: String, offer_term_code: String },
    #[error("could not serialize catalog snapshot: {0}")]
    Serialize(serde_json::Error),
}

impl CatalogError {
    /// Stable class name used by the CLI when reporting failures.
    pub fn class(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "catalog_not_found",
            Self::Read { .. } => "catalog_read",
            Self::Parse { .. } => "catalog_parse",
            Self::DuplicateOffer { .. } => "catalog_duplicate_offer",
            Self::Serialize(_) => "catalog_serialize",
        }
    }
}

/// A usage record that names no operating system, cache engine or database
/// engine (or a database engine without a recognised deployment option).
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error(
    "usage record for `{instance_type}` in `{region}` (account `{account_id}`, period `{period}`) has no recognised engine dimension"
)]
pub struct InvalidUsageDimensionError {
    pub account_id: String,
    pub region: String,
    pub instance_type: String,
    pub period: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    #[error(transparent)]
    InvalidUsageDimension(#[from] InvalidUsageDimensionError),
    #[error("recommendation requires at least one usage record")]
    EmptyUsage,
    #[error("usage records span more than one usage dimension")]
    MixedUsageDimensions,
    #[error("no catalog offers match `{instance_type}` in `{region}`")]
    NoCandidateOffers { instance_type: String, region: String },
    #[error("offer `{sku}` does not price usage type `{usage_type}`")]
    OfferDimensionMismatch { sku: String, usage_type: String },
    #[error("usage for period `{period}` is out of range: {reason}")]
    UsageOutOfRange { period: String, reason: &'static str },
    #[error("cost of offer `{sku}` exceeds the representable range")]
    CostOutOfRange { sku: String },
}

impl RecommendError {
    pub fn class(&self) -> &'static str {
        match self {
            Self::InvalidUsageDimension(_) => "invalid_usage_dimension",
            Self::EmptyUsage => "empty_usage",
            Self::MixedUsageDimensions => "mixed_usage_dimensions",
            Self::NoCandidateOffers { .. } => "no_candidate_offers",
            Self::OfferDimensionMismatch { .. } => "offer_dimension_mismatch",
            Self::UsageOutOfRange { .. } => "usage_out_of_range",
            Self::CostOutOfRange { .. } => "cost_out_of_range",
        }
    }
}
