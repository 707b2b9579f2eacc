use std::sync::Arc;

use chat_gateway::config::Config;
use chat_gateway::identity::{IdentityGateway, RestIdentityGateway};
use chat_gateway::relay::{ConversationRelay, RestConversationRelay};
use chat_gateway::routes::api_routes;
use chat_gateway::store::{RestUserStore, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  Set CHAT_GATEWAY_IDENTITY_CONFIG / CHAT_GATEWAY_DB_CONFIG / CHAT_GATEWAY_NLU_CONFIG");
        std::process::exit(1);
    });

    eprintln!("💬 Chat Gateway v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!("   NLU project: {}", config.nlu.project_id);
    eprintln!("   Database: {}", config.database.database_url);

    // ── Collaborators ───────────────────────────────────────────────────
    // Built once, shared immutably for the process lifetime. All mutable
    // state lives in the external store.
    let identity: Arc<dyn IdentityGateway> = Arc::new(RestIdentityGateway::new(config.identity));
    let relay: Arc<dyn ConversationRelay> = Arc::new(RestConversationRelay::new(config.nlu));
    let store: Arc<dyn UserStore> = Arc::new(RestUserStore::new(config.database));

    let app = api_routes(identity, relay, store);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Chat gateway started");
    axum::serve(listener, app).await?;

    Ok(())
}
