use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use reserva_core::{
    LeaseContractLength, OfferFilter, OfferSeed, OfferingClass, PriceOffer, PricingCatalog,
    PurchaseOption, PurchaseRequest, RecommendationEngine, Sku, UsageKind, UsageQuantity,
};
use rust_decimal::Decimal;
use tempfile::TempDir;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ap-northeast-1.json")
}

fn fixture() -> PricingCatalog {
    PricingCatalog::load(fixture_path()).expect("load fixture catalog")
}

fn linux_shared_m4_large(catalog: &PricingCatalog) -> Vec<Arc<PriceOffer>> {
    let filters = [
        OfferFilter::Region("ap-northeast-1".to_string()),
        OfferFilter::OperatingSystem("Linux".to_string()),
        OfferFilter::Tenancy("Shared".to_string()),
        OfferFilter::PreInstalled("NA".to_string()),
        OfferFilter::OfferingClass(OfferingClass::Standard),
    ];
    catalog.query("m4.large", &filters).as_slice().to_vec()
}

fn breakevens(
    offers: &[Arc<PriceOffer>],
    lease: LeaseContractLength,
) -> Vec<(PurchaseOption, u32)> {
    offers
        .iter()
        .filter(|offer| offer.lease_contract_length == lease)
        .filter_map(|offer| offer.breakeven_point_in_month().map(|m| (offer.purchase_option, m)))
        .collect()
}

fn usage(month: &str, hours: i64) -> UsageQuantity {
    UsageQuantity {
        account_id: "123456789012".to_string(),
        description: "production".to_string(),
        region: "ap-northeast-1".to_string(),
        instance_type: "m4.large".to_string(),
        platform: Some("Linux/UNIX".to_string()),
        cache_engine: None,
        database_engine: None,
        deployment_option: None,
        date: month.to_string(),
        instance_hours: Decimal::from(hours),
        reserved_hours: Decimal::ZERO,
    }
}

fn months(count: u32) -> impl Iterator<Item = String> {
    (1..=count).map(|month| format!("2018-{month:02}"))
}

#[test]
fn fixture_loads_every_offer_in_order() {
    let catalog = fixture();

    assert_eq!(catalog.len(), 12);
    let first = catalog.all().first().cloned().expect("first offer");
    assert_eq!(first.sku, Sku("7MYWT7Y96UT3NJ2D".to_string()));
    assert_eq!(first.purchase_option, PurchaseOption::NoUpfront);
}

#[test]
fn one_year_breakeven_months_follow_upfront_commitment() {
    let catalog = fixture();
    let offers = linux_shared_m4_large(&catalog);

    assert_eq!(offers.len(), 6);
    assert_eq!(
        breakevens(&offers, LeaseContractLength::OneYear),
        vec![
            (PurchaseOption::NoUpfront, 1),
            (PurchaseOption::PartialUpfront, 6),
            (PurchaseOption::AllUpfront, 8),
        ]
    );
}

#[test]
fn three_year_breakeven_months_follow_upfront_commitment() {
    let catalog = fixture();
    let offers = linux_shared_m4_large(&catalog);

    assert_eq!(
        breakevens(&offers, LeaseContractLength::ThreeYears),
        vec![
            (PurchaseOption::NoUpfront, 1),
            (PurchaseOption::PartialUpfront, 11),
            (PurchaseOption::AllUpfront, 16),
        ]
    );
}

#[test]
fn redis_heavy_utilization_three_year_offer() {
    let catalog = fixture();
    let offers = catalog.query(
        "cache.m4.large",
        &[
            OfferFilter::Engine("Redis".to_string()),
            OfferFilter::PurchaseOption(PurchaseOption::HeavyUtilization),
            OfferFilter::LeaseContractLength(LeaseContractLength::ThreeYears),
        ],
    );
    let offer = offers.first().expect("redis offer");

    assert_eq!(offer.breakeven_point_in_month(), Some(11));
    let cost = offer.expected_cost(0, 1).expect("cost in range");
    assert!(cost.savings > Decimal::ZERO);
    assert_eq!(cost.full_on_demand, Decimal::new(528228, 2));
    assert_eq!(cost.reserved_applied.total, Decimal::new(23946, 1));
}

#[test]
fn dedicated_and_windows_offers_are_filtered_out() {
    let catalog = fixture();
    let all_m4 = catalog.find_by_instance_type("m4.large");

    assert_eq!(all_m4.len(), 8);
    assert_eq!(all_m4.tenancy("Dedicated").len(), 1);
    assert_eq!(all_m4.operating_system("Windows").len(), 1);
    assert_eq!(linux_shared_m4_large(&catalog).len(), 6);
}

#[test]
fn snapshot_round_trip_preserves_offers_and_order() {
    let catalog = fixture();
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("snapshot.json");

    fs::write(&path, catalog.to_json().expect("serialize catalog")).expect("write snapshot");
    let reloaded = PricingCatalog::load(&path).expect("reload snapshot");

    assert_eq!(reloaded.all(), catalog.all());
}

#[test]
fn invalid_offer_fails_the_whole_load() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("broken.json");
    fs::write(
        &path,
        r#"[{"sku": "X", "region": "ap-northeast-1", "instance_type": "m4.large",
             "lease_contract_length": "1yr", "purchase_option": "No Upfront",
             "operating_system": "Linux", "cache_engine": "Redis", "on_demand": "0.1"}]"#,
    )
    .expect("write snapshot");

    let error = PricingCatalog::load(&path).expect_err("two engine columns must fail");
    assert_eq!(error.class(), "catalog_parse");
    assert!(error.to_string().contains("more than one engine column"));
}

#[test]
fn steady_linux_usage_recommends_one_year_all_upfront() {
    let engine = RecommendationEngine::new(Arc::new(fixture()));
    let records: Vec<UsageQuantity> = months(12).map(|month| usage(&month, 1460)).collect();

    let report = engine.recommend_usage(&records);

    assert!(report.errors.is_empty());
    let recommended = &report.recommended[0];
    assert_eq!(recommended.offer.lease_contract_length, LeaseContractLength::OneYear);
    assert_eq!(recommended.offer.purchase_option, PurchaseOption::AllUpfront);
    assert_eq!(recommended.usage.reserved_instance_num, 2);

    let record = recommended.record();
    assert_eq!(record.usage_type, "APN1-BoxUsage:m4.large");
    assert_eq!(record.os_engine, "Linux");
    assert_eq!(record.saving_cost, Decimal::new(83408, 2));
}

#[test]
fn cache_and_database_usage_resolve_their_own_offers() {
    let engine = RecommendationEngine::new(Arc::new(fixture()));
    let mut records = Vec::new();
    for month in months(12) {
        records.push(UsageQuantity {
            instance_type: "cache.m4.large".to_string(),
            platform: None,
            cache_engine: Some("Redis".to_string()),
            ..usage(&month, 730)
        });
        records.push(UsageQuantity {
            instance_type: "db.r4.large".to_string(),
            platform: None,
            database_engine: Some("MySQL".to_string()),
            deployment_option: Some("Multi-AZ".to_string()),
            ..usage(&month, 730)
        });
    }

    let report = engine.recommend_usage(&records);

    assert!(report.errors.is_empty());
    assert_eq!(report.recommended.len(), 2);

    let cache = &report.recommended[0];
    assert_eq!(cache.offer.lease_contract_length, LeaseContractLength::OneYear);
    assert_eq!(cache.breakeven_month, Some(7));
    assert_eq!(cache.cost.reserved_applied.total, Decimal::new(117712, 2));

    let database = &report.recommended[1];
    assert!(UsageKind::MultiAzUsage.matches_usage_type(&database.offer.usage_type));
    assert_eq!(database.offer.sku, Sku("YK3ZWJ9H2X7KQ7RA".to_string()));
    assert!(database.reservation_worthy);
}

#[test]
fn purchase_batch_decodes_price_quantity_documents() {
    let catalog = Arc::new(fixture());
    let price = catalog.all().first().cloned().expect("first offer");
    let quantity: Vec<UsageQuantity> = months(3).map(|month| usage(&month, 730)).collect();
    let document = serde_json::json!([{ "price": price.as_ref(), "quantity": quantity }]);

    let purchases: Vec<PurchaseRequest> =
        serde_json::from_value(document).expect("decode purchase batch");
    let report = RecommendationEngine::new(Arc::clone(&catalog)).recommend_batch(&purchases);

    assert!(report.errors.is_empty());
    let recommended = &report.recommended[0];
    assert_eq!(recommended.offer.purchase_option, PurchaseOption::NoUpfront);
    assert_eq!(recommended.usage.horizon_months, 3);
    assert_eq!(recommended.usage.reserved_instance_num, 1);

    let seed = OfferSeed::Offer(price.as_ref().clone());
    let direct = RecommendationEngine::new(catalog).recommend(&quantity, &seed).expect("recommend");
    assert_eq!(&direct, recommended);
}
