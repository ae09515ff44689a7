//! SupportDesk Gateway entry point

use std::sync::Arc;

use axum::Router;
use supportdesk_gateway::db::{ConversationRepository, InMemoryConversationRepository};
use supportdesk_gateway::{build_routes, metrics, ChatService, GatewayConfig, GATEWAY_VERSION};
use supportdesk_runtime::{CompletionClient, CompletionConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "supportdesk_gateway=debug,supportdesk_runtime=info,tower_http=debug".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SupportDesk Gateway v{}", GATEWAY_VERSION);
    metrics::init_metrics();

    let completion = CompletionConfig::from_env();
    tracing::info!(
        api_key_set = completion.api_key.is_some(),
        model = completion.model.as_deref().unwrap_or("<unset>"),
        base_url = %completion.base_url,
        "completion provider configured"
    );
    if let Err(e) = completion.validate() {
        tracing::warn!("{e} Chat requests will fail until it is provided.");
    }

    let config = GatewayConfig::from_env()?;
    let repository = open_repository(&config).await?;
    let generator = Arc::new(CompletionClient::from_config(completion)?);
    let service = ChatService::new(repository, generator)
        .with_max_message_chars(config.max_message_chars);

    let app = Router::new()
        .merge(build_routes(Arc::new(service)))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "persistence-sqlx")]
async fn open_repository(
    config: &GatewayConfig,
) -> anyhow::Result<Arc<dyn ConversationRepository>> {
    use supportdesk_gateway::db::{init_pool, initialize_schema, SqlxConversationRepository};

    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL is not set; history is kept in memory");
        return Ok(Arc::new(InMemoryConversationRepository::new()));
    };
    let pool = init_pool(url).await?;
    initialize_schema(&pool).await?;
    tracing::info!("conversation history stored in SQLite");
    Ok(Arc::new(SqlxConversationRepository::new(pool)))
}

#[cfg(not(feature = "persistence-sqlx"))]
async fn open_repository(
    config: &GatewayConfig,
) -> anyhow::Result<Arc<dyn ConversationRepository>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL ignored: built without persistence-sqlx");
    }
    Ok(Arc::new(InMemoryConversationRepository::new()))
}
