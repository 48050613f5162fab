use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use agentshield_api::api::{self, AppState};
use agentshield_api::auth::{
    generate_api_key, hash_api_key, ApiKeyVerifier, PermissiveVerifier, StaticKeyVerifier,
};
use agentshield_api::config::{AuthMode, Config, StorageBackend};
use agentshield_api::infrastructure::repositories::{
    InMemoryStore, PostgresAgentRepository, PostgresAuditLogRepository,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // `generate-key [prefix]` prints a fresh API key and the hash to configure
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("generate-key") {
        let prefix = args.next().unwrap_or_else(|| "as".to_string());
        let key = generate_api_key(&prefix);
        println!("API key:  {}", key);
        println!("SHA-256:  {}", hash_api_key(&key));
        return;
    }

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let verifier: Arc<dyn ApiKeyVerifier> = match config.auth_mode {
        AuthMode::Permissive => {
            tracing::warn!("AUTH_MODE=permissive: any non-empty X-API-Key is accepted");
            Arc::new(PermissiveVerifier)
        }
        AuthMode::Static => {
            let verifier = StaticKeyVerifier::new(config.api_key_hashes.clone());
            tracing::info!("Loaded {} API key hashes", verifier.key_count());
            Arc::new(verifier)
        }
    };

    let state = match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("STORAGE_BACKEND=memory: data is lost on restart");
            AppState::in_memory(InMemoryStore::new(), verifier)
        }
        StorageBackend::Postgres => {
            let database_url = config.database_url.as_deref().unwrap_or_default();

            // Connect to database
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");

            if config.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .expect("Failed to run database migrations");
            }

            tracing::info!("Database connected successfully");
            AppState::new(
                Arc::new(PostgresAgentRepository::new(pool.clone())),
                Arc::new(PostgresAuditLogRepository::new(pool)),
                verifier,
            )
        }
    };

    let app = api::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("AgentShield API listening on {} ({})", addr, config.environment);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
