//! Tourbroker demo.
//!
//! Seeds in-memory collaborators with a small San Andrés catalog, prints a
//! group quote and an itinerary quote, then runs a checkout end to end.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tourbroker-demo
//! RUST_LOG=debug BROKER_MARGIN=0.25 cargo run --bin tourbroker-demo
//! ```

use anyhow::Context;
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tourbroker_core::environment::SystemClock;
use tourbroker_engine::mocks::{InMemoryCatalog, InMemoryInventory, MockLedger, MockPaymentGateway};
use tourbroker_engine::{
    AddLine, CatalogItem, Category, CheckoutEnvironment, CheckoutInput, CheckoutSession, EngineConfig,
    GroupQuoteCalculator, ItemId, ItineraryAggregator, ItineraryPlan, Money, PartyComposition,
    PaymentMethod, TravelerInfo,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("posada-coco", "Posada Nativa Coco", Category::Lodging, Money::from_pesos(200_000))
            .with_occupancy_price(1, Money::from_pesos(150_000))
            .with_occupancy_price(2, Money::from_pesos(180_000))
            .with_max_guests(4),
        CatalogItem::new("tour-acuario", "Acuario & Haynes Cay", Category::Tour, Money::from_pesos(85_000)),
        CatalogItem::new("tour-rondon", "Vuelta a la isla", Category::Tour, Money::from_pesos(180_000)),
        CatalogItem::new("taxi-z1", "Taxi Centro / North End", Category::Transport, Money::from_pesos(50_000))
            .with_zone_fare(Money::from_pesos(50_000), Money::from_pesos(70_000)),
        CatalogItem::new("coco-art", "Coco Art workshop", Category::Craft, Money::from_pesos(100_000)),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = EngineConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("=== Tourbroker demo ===");

    // Group quote
    let party = PartyComposition::new(17, 1, 1)?;
    let group = GroupQuoteCalculator::from_config(&config).quote(&party)?;
    info!(
        rooms = group.rooms_needed,
        taxis = group.taxis_needed,
        net = %group.net_total,
        pvp = %group.pvp_total,
        "Group quote"
    );

    // Itinerary quote
    let start = NaiveDate::from_ymd_opt(2025, 11, 14).context("invalid start date")?;
    let end = start.checked_add_days(Days::new(3)).context("invalid end date")?;
    let mut plan = ItineraryPlan::new(start, end, config.itinerary.max_days)?;
    let items = catalog();
    for (offset, id) in [(0, "taxi-z1"), (1, "tour-acuario"), (2, "tour-rondon"), (3, "taxi-z1")] {
        let item = items
            .iter()
            .find(|item| item.id.as_str() == id)
            .cloned()
            .context("demo item missing from catalog")?;
        let date = start.checked_add_days(Days::new(offset)).context("date out of range")?;
        plan.add_item(date, item)?;
    }
    let family = PartyComposition::new(2, 2, 1)?;
    let quote = ItineraryAggregator::from_config(&config).quote(&plan, &family)?;
    info!(
        days = quote.days.len(),
        net = %quote.net_total,
        pvp = %quote.pvp_total,
        margin = %quote.margin_value,
        "Itinerary quote"
    );

    // Checkout
    let inventory = Arc::new(InMemoryInventory::with_default_capacity(20));
    let environment = CheckoutEnvironment::new(
        config,
        inventory,
        Arc::new(MockPaymentGateway::new()),
        Arc::new(MockLedger::new()),
        Arc::new(InMemoryCatalog::with_items(items)),
        Arc::new(SystemClock),
    );
    let session = CheckoutSession::new(environment);

    session
        .add_catalog_item(ItemId::new("posada-coco"), AddLine::new(2, start).for_nights(3))
        .await?;
    session
        .add_catalog_item(ItemId::new("tour-acuario"), AddLine::new(2, start).at("09:00"))
        .await?;
    session
        .add_catalog_item(ItemId::new("taxi-z1"), AddLine::new(2, start))
        .await?;
    let totals = session.totals().await;
    info!(total = %totals.total_price, items = totals.item_count, "Cart ready");

    session.advance(CheckoutInput::Proceed).await?;
    session
        .advance(CheckoutInput::SubmitTraveler(TravelerInfo {
            full_name: "Ana Gómez".into(),
            email: "ana@example.com".into(),
            phone: "+57 300 000 0000".into(),
            document_id: "CC 1020304050".into(),
            country: "Colombia".into(),
            billing_address: "Calle 10 # 5-20, Bogotá".into(),
            accommodation: "Posada Nativa Coco".into(),
            emergency_contact: "Luis Gómez +57 301 111 1111".into(),
        }))
        .await?;
    let stage = session
        .advance(CheckoutInput::ConfirmPayment(PaymentMethod::Hedera))
        .await?;
    info!(?stage, "Checkout finished");

    if let Some(reservation) = session.reservation().await {
        println!("{}", serde_json::to_string_pretty(&reservation)?);
    }

    session.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
