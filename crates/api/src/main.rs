use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siteforge_api::config::ServerConfig;
use siteforge_api::router::build_app_router;
use siteforge_api::state::AppState;
use siteforge_core::store::{FallbackTemplates, TemplateStore};
use siteforge_db::store::PgTemplateStore;
use siteforge_engine::chat::OpenAiChatClient;
use siteforge_engine::memory::MemoryTemplateStore;
use siteforge_engine::render::TemplateRenderer;
use siteforge_engine::{EngineConfig, PlanningEngine};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siteforge_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store: PostgreSQL, or in-memory degraded mode ---
    let (store, pool): (Arc<dyn TemplateStore>, Option<siteforge_db::DbPool>) =
        match std::env::var("DATABASE_URL") {
            Ok(database_url) => {
                let pool = siteforge_db::create_pool(&database_url)
                    .await
                    .expect("Failed to connect to database");
                tracing::info!("Database connection pool created");

                siteforge_db::health_check(&pool)
                    .await
                    .expect("Database health check failed");
                tracing::info!("Database health check passed");

                siteforge_db::run_migrations(&pool)
                    .await
                    .expect("Failed to run database migrations");
                tracing::info!("Database migrations applied");

                (Arc::new(PgTemplateStore::new(pool.clone())), Some(pool))
            }
            Err(_) => {
                tracing::warn!(
                    "DATABASE_URL not set; running in degraded mode on the in-memory store"
                );
                (Arc::new(MemoryTemplateStore::with_builtin_library()), None)
            }
        };

    // --- Chat client ---
    let chat = Arc::new(
        OpenAiChatClient::from_env().expect("Chat client configuration invalid"),
    );

    // --- Fallback library and renderer ---
    let fallback: Arc<dyn FallbackTemplates> =
        Arc::new(MemoryTemplateStore::with_builtin_library());
    let renderer = Arc::new(TemplateRenderer::new());

    // --- Engine ---
    let engine = Arc::new(PlanningEngine::new(
        store,
        chat,
        renderer,
        fallback,
        EngineConfig::default(),
    ));
    tracing::info!("Planning engine constructed");

    // --- App state and router ---
    let state = AppState {
        engine,
        pool,
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // --- Serve ---
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT combination");
    tracing::info!(%addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .await
        .expect("Server error");
}
