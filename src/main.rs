use actix::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use delivery_orders::actors::{DispatcherSink, GetDispatchStats, NotificationDispatcher};
use delivery_orders::config::AppConfig;
use delivery_orders::domain::order::{
    Actor as OrderActor, Collaborators, OrderCommandHandler, OrderEvent, OrderStatus, PlaceOrderRequest,
};
use delivery_orders::domain::ports::{InMemoryCatalog, InMemoryRateSource, RecordingNotificationSink};
use delivery_orders::domain::pricing::LineRequest;
use delivery_orders::domain::settlement::SettlementScope;
use delivery_orders::event_sourcing::EventStore;
use delivery_orders::metrics;

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,delivery_orders=debug"))
        )
        .init();

    tracing::info!("🚀 Starting delivery order engine demo");

    // === 1. Configuration ===
    let config = AppConfig::from_env()?;
    tracing::info!(
        prefix = %config.order_number_prefix,
        rates_version = config.platform_rates.version,
        "Configuration loaded"
    );

    // === 2. Initialize Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    if config.metrics_port != 0 {
        // Start metrics HTTP server in background thread
        let metrics_registry = Arc::new(metrics.registry().clone());
        let port = config.metrics_port;
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to build metrics runtime: {}", e);
                    return;
                }
            };
            rt.block_on(async {
                if let Err(e) = metrics::start_metrics_server(metrics_registry, port).await {
                    tracing::error!("Metrics server error: {}", e);
                }
            });
        });
    }

    // === 3. Collaborators ===
    let catalog = Arc::new(InMemoryCatalog::new());
    let rates = Arc::new(InMemoryRateSource::new(config.platform_rates.clone()));
    let inbox = Arc::new(RecordingNotificationSink::new());

    let owner_id = Uuid::new_v4();
    let restaurant_id = catalog.add_restaurant("Spice Route", owner_id, None).await;
    let biryani = catalog.add_menu_item(restaurant_id, "Veg Biryani", Decimal::from(100)).await;
    let butter_chicken = catalog.add_menu_item(restaurant_id, "Butter Chicken", Decimal::from(150)).await;
    let partner_id = catalog.add_partner().await;

    // === 4. Notification dispatcher actor ===
    let dispatcher = NotificationDispatcher::new(inbox.clone(), config.notification_breaker.clone())
        .with_metrics(metrics.clone())
        .start();

    // === 5. Order command handler ===
    let event_store = Arc::new(EventStore::<OrderEvent>::new("Order"));
    let handler = OrderCommandHandler::new(
        event_store,
        Collaborators {
            menu: catalog.clone(),
            restaurants: catalog.clone(),
            partners: catalog.clone(),
            rates,
            notifier: Arc::new(DispatcherSink::new(dispatcher.clone())),
        },
    )
    .with_metrics(metrics.clone())
    .with_display_prefix(config.order_number_prefix.clone());

    // === 6. Demonstrate full order lifecycle ===
    tracing::info!("📝 Demonstrating order lifecycle");

    let customer_id = Uuid::new_v4();
    let order = handler
        .place_order(
            customer_id,
            PlaceOrderRequest {
                restaurant_id,
                lines: vec![LineRequest::new(biryani, 1), LineRequest::new(butter_chicken, 1)],
                delivery_address: "12 MG Road, Bengaluru".to_string(),
                distance_km: Decimal::from(4),
                customer_note: Some("Less spicy please".to_string()),
            },
        )
        .await?;
    tracing::info!("✅ Order placed: {} (total ₹{})", order.display_number, order.financials.total_amount);

    let kitchen = OrderActor::restaurant(restaurant_id);
    for target in [OrderStatus::Accepted, OrderStatus::Preparing, OrderStatus::Ready] {
        handler.transition(order.id, kitchen, target, None).await?;
        tracing::info!("✅ Order {} → {}", order.display_number, target);
    }

    handler.assign_delivery(order.id, partner_id).await?;
    tracing::info!("✅ Delivery partner {} assigned", partner_id);

    let rider = OrderActor::delivery(partner_id);
    for target in [OrderStatus::PickedUp, OrderStatus::Delivered] {
        handler.transition(order.id, rider, target, None).await?;
        tracing::info!("✅ Order {} → {}", order.display_number, target);
    }

    handler
        .rate(order.id, customer_id, 5, Some("Hot and on time".to_string()))
        .await?;

    // === 7. Settlement ===
    let stats = handler.settlement(SettlementScope::Platform).await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    let dispatch = dispatcher.send(GetDispatchStats).await?;
    tracing::info!(
        delivered = dispatch.delivered,
        failed = dispatch.failed,
        dropped = dispatch.dropped,
        sent = inbox.sent().await.len(),
        "Notification dispatch summary"
    );

    tracing::info!("🎉 Demo complete!");

    Ok(())
}
