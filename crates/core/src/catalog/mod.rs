//! In-memory reservation price catalog.
//!
//! Offers are loaded once from a JSON snapshot and never mutated afterwards.
//! Lookups start from an instance-type seed and narrow through
//! [`OfferFilter`]s; narrowed sets for repeated queries are memoized behind a
//! lock so concurrent recommendation calls can share them.

pub mod filter;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::domain::offer::{PriceOffer, Sku};
use crate::errors::CatalogError;

pub use filter::{OfferFilter, OfferSet};

/// Memo key: an instance type plus its filters in canonical order. Filters
/// commute, so every permutation of the same chain shares one entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct QueryKey {
    instance_type: String,
    filters: Vec<OfferFilter>,
}

impl QueryKey {
    fn new(instance_type: &str, filters: &[OfferFilter]) -> Self {
        let mut filters = filters.to_vec();
        filters.sort();
        filters.dedup();
        Self { instance_type: instance_type.to_string(), filters }
    }
}

#[derive(Debug, Default)]
pub struct PricingCatalog {
    offers: Vec<Arc<PriceOffer>>,
    by_instance_type: HashMap<String, OfferSet>,
    memo: RwLock<HashMap<QueryKey, OfferSet>>,
}

impl PricingCatalog {
    pub fn new(offers: Vec<PriceOffer>) -> Self {
        let offers: Vec<Arc<PriceOffer>> = offers.into_iter().map(Arc::new).collect();

        let mut grouped: HashMap<String, Vec<Arc<PriceOffer>>> = HashMap::new();
        for offer in &offers {
            grouped.entry(offer.instance_type.clone()).or_default().push(Arc::clone(offer));
        }
        let by_instance_type =
            grouped.into_iter().map(|(key, offers)| (key, OfferSet::new(offers))).collect();

        Self { offers, by_instance_type, memo: RwLock::new(HashMap::new()) }
    }

    /// Load a snapshot file. A missing file is [`CatalogError::NotFound`]; a
    /// malformed document is [`CatalogError::Parse`] and yields no catalog.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => CatalogError::NotFound { path: path.to_path_buf() },
            _ => CatalogError::Read { path: path.to_path_buf(), source },
        })?;

        let catalog = Self::from_slice(&raw, path)?;
        info!(
            event_name = "catalog.loaded",
            path = %path.display(),
            offers = catalog.len(),
            instance_types = catalog.by_instance_type.len(),
            "pricing catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse a snapshot document; `origin` names the source in errors. An
    /// offer is keyed by SKU and offer term code, and a key may appear once.
    pub fn from_slice(raw: &[u8], origin: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let origin = origin.into();
        let offers: Vec<PriceOffer> = serde_json::from_slice(raw)
            .map_err(|source| CatalogError::Parse { path: origin.clone(), source })?;

        let mut seen = HashSet::new();
        for offer in &offers {
            if !seen.insert((&offer.sku, &offer.offer_term_code)) {
                return Err(CatalogError::DuplicateOffer {
                    path: origin,
                    sku: offer.sku.0.clone(),
                    offer_term_code: offer.offer_term_code.clone(),
                });
            }
        }
        Ok(Self::new(offers))
    }

    /// Serialize the catalog back to a snapshot document in load order.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let offers: Vec<&PriceOffer> = self.offers.iter().map(|offer| offer.as_ref()).collect();
        serde_json::to_string_pretty(&offers).map_err(CatalogError::Serialize)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn all(&self) -> OfferSet {
        OfferSet::new(self.offers.clone())
    }

    /// First offer in load order with `sku`. A SKU spans one offer per
    /// offer term, so callers that need a specific term narrow by it.
    pub fn find_by_sku(&self, sku: &Sku) -> Option<Arc<PriceOffer>> {
        self.offers.iter().find(|offer| &offer.sku == sku).cloned()
    }

    /// Seed set for an instance type; empty when the catalog has none.
    pub fn find_by_instance_type(&self, instance_type: &str) -> OfferSet {
        self.by_instance_type.get(instance_type).cloned().unwrap_or_default()
    }

    /// Narrow the seed set for `instance_type` by every filter, reusing the
    /// result of any earlier identical (or reordered) query.
    pub fn query(&self, instance_type: &str, filters: &[OfferFilter]) -> OfferSet {
        let key = QueryKey::new(instance_type, filters);

        let cached = match self.memo.read() {
            Ok(memo) => memo.get(&key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&key).cloned(),
        };
        if let Some(set) = cached {
            return set;
        }

        let set = self.find_by_instance_type(instance_type).filter_all(&key.filters);
        debug!(
            event_name = "catalog.cache_miss",
            instance_type,
            filters = key.filters.len(),
            offers = set.len(),
            "narrowed offer set computed"
        );

        match self.memo.write() {
            Ok(mut memo) => memo.entry(key).or_insert(set).clone(),
            Err(poisoned) => poisoned.into_inner().entry(key).or_insert(set).clone(),
        }
    }

    pub fn cached_queries(&self) -> usize {
        match self.memo.read() {
            Ok(memo) => memo.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
