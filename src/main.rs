use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use timeline_event_store::docstore::{DocumentSession, DocumentStore, InMemoryDocumentStore};
use timeline_event_store::domain::account::*;
use timeline_event_store::metrics::{self, Metrics};
use timeline_event_store::utils::{retry_on_transient, RetryConfig};
use timeline_event_store::{
    Aggregate, BroadcastDispatcher, DomainEvent, EventStore, EventStoreConfig,
};

type Store = EventStore<InMemoryDocumentStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EventStoreConfig::from_env();

    // Initialize structured logging with environment-based filtering
    // RUST_LOG wins over EVENT_STORE_LOG_FILTER
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!("🚀 Starting timeline event store demo");

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    if config.metrics_enabled() {
        let registry = Arc::new(metrics.registry().clone());
        let port = config.metrics_port;
        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!("Metrics runtime error: {}", e);
                    return;
                }
            };
            runtime.block_on(async {
                if let Err(e) = metrics::start_metrics_server(registry, port).await {
                    tracing::error!("Metrics server error: {}", e);
                }
            });
        });
    }

    // === 2. Dispatcher + subscriber ===
    let dispatcher = Arc::new(BroadcastDispatcher::new(64));
    let mut receiver = dispatcher.subscribe();
    let subscriber = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => tracing::debug!(
                    event_id = %event.id(),
                    event_type = event.event_type(),
                    "📨 Dispatched event received"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Subscriber lagged behind dispatcher")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // === 3. Event store ===
    let store = EventStore::builder()
        .document_store(InMemoryDocumentStore::new())
        .event_dispatcher(dispatcher.clone())
        .registry(account_registry())
        .metrics(metrics.clone())
        .build()
        .await?;
    drop(dispatcher);

    // === 4. Record a history on the primary timeline and one branch ===
    let retry = RetryConfig::default().with_max_attempts(config.save_retries);
    let account = Uuid::new_v4();
    let savings = Uuid::new_v4();
    let what_if = Uuid::new_v4();
    let base = Utc::now() - Duration::days(30);

    save(&store, &retry, AccountOpened::new(account, "Ada Lovelace", base)).await?;
    save(&store, &retry, Deposited::new(account, 250_000, base + Duration::days(1))).await?;
    save(&store, &retry, Withdrawn::new(account, 80_000, base + Duration::days(10))).await?;
    save(
        &store,
        &retry,
        TransferReceived::new(account, savings, 50_000, base + Duration::days(20)),
    )
    .await?;
    save(
        &store,
        &retry,
        Withdrawn::new(account, 200_000, base + Duration::days(15)).on_timeline(what_if),
    )
    .await?;

    // === 5. Travel through time ===
    let instants: [(&str, DateTime<Utc>, Option<Uuid>); 5] = [
        ("before opening", base - Duration::days(1), None),
        ("day 5", base + Duration::days(5), None),
        ("day 16", base + Duration::days(16), None),
        ("day 16 (what-if)", base + Duration::days(16), Some(what_if)),
        ("today", Utc::now(), None),
    ];

    for (label, at, timeline) in instants {
        match store.load_aggregate::<BankAccount>(account, at, timeline).await? {
            Some(state) => tracing::info!(
                label,
                balance = state.balance,
                version = state.version,
                "💰 Account state"
            ),
            None => tracing::info!(label, "💰 Account did not exist yet"),
        }
    }

    let history = store
        .retrieve_events(account, Utc::now(), &BankAccount::event_mappings(), Some(what_if))
        .await?;
    for event in &history {
        tracing::info!(
            event_type = event.event_type(),
            at = %event.timestamp(),
            timeline_id = ?event.timeline_id(),
            "📜 What-if history"
        );
    }

    let deposits = store.find(|d: &Deposited| d.account_id == account).await?;
    tracing::info!(deposit_count = deposits.len(), "🔎 Deposits found");

    // === 6. A read model shares the store without entering the event stream ===
    if let Some(current) = store
        .load_aggregate::<BankAccount>(account, Utc::now(), None)
        .await?
    {
        let mut session = store.document_store().open_session();
        session.store(&AccountSummary::from(&current))?;
        session.save_changes().await?;
    }

    tracing::info!(
        documents = store.document_store().document_count().await,
        metric_families = metrics.registry().gather().len(),
        "🎉 Demo complete!"
    );

    drop(store);
    subscriber.await?;
    Ok(())
}

async fn save<E>(store: &Store, retry: &RetryConfig, event: E) -> anyhow::Result<()>
where
    E: DomainEvent + Serialize + Clone,
{
    retry_on_transient(retry.clone(), move |_attempt| store.save(event.clone()))
        .await
        .into_result()?;
    Ok(())
}
