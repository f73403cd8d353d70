//! SVID Server Binary
//!
//! Runs the node attestation and SVID issuance HTTP server.

use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use svid_plugins::attestors::{JoinToken, JoinTokenAttestor, MockAttestor};
use svid_plugins::{AttestorSetBuilder, NoopNodeResolver};
use svid_server::{
    create_router, AppState, DataStore, MemoryStore, NodeService, NodeServiceConfig,
    SelfSignedCa, ServerConfig,
};

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env().expect("Invalid server configuration");

    // Initialize logging
    let log_level = config.log_level.parse().unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let store = open_store(&config).await;

    let ca = SelfSignedCa::new(&config.trust_domain)
        .expect("Failed to create CA")
        .with_cert_ttl(config.svid_ttl);

    let join_tokens = JoinTokenAttestor::new(&config.trust_domain);
    for token in &config.join_tokens {
        join_tokens.add_token(JoinToken::new(token));
    }
    let mut attestors = AttestorSetBuilder::new().with_attestor(join_tokens);
    if config.enable_mock_attestor {
        warn!("Mock attestor enabled; any node can claim any ID");
        attestors = attestors.with_attestor(MockAttestor::new());
    }

    let service = NodeService::new(
        NodeServiceConfig {
            base_svid_ttl: config.base_svid_ttl,
        },
        store,
        Arc::new(ca),
        attestors.build(),
        Arc::new(NoopNodeResolver),
    );

    info!(
        trust_domain = %config.trust_domain,
        join_tokens = config.join_tokens.len(),
        port = config.port,
        "Starting SVID server"
    );

    let app = create_router(Arc::new(AppState::new(service)));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, "SVID server listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

#[cfg(feature = "postgres")]
async fn open_store(config: &ServerConfig) -> Arc<dyn DataStore> {
    match &config.database_url {
        Some(url) => Arc::new(
            svid_server::storage::PostgresStore::new(url)
                .await
                .expect("Failed to connect to database"),
        ),
        None => Arc::new(MemoryStore::new()),
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_store(config: &ServerConfig) -> Arc<dyn DataStore> {
    if config.database_url.is_some() {
        warn!("SVID_SERVER_DATABASE_URL set but postgres support is not compiled in");
    }
    Arc::new(MemoryStore::new())
}
