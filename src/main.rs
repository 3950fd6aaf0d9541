use chat_assistant::config::AppConfig;
use chat_assistant::inference_client::{HuggingFaceClient, InferenceGateway, UnconfiguredGateway};
use chat_assistant::services::{ConversationManager, SessionAuthenticator};
use chat_assistant::store::{
    FlashcardStore, InMemoryFlashcardStore, InMemoryUserStore, PgFlashcardStore, PgUserStore, UserStore,
};
use chat_assistant::{db, AppState};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging()?;

    let config = AppConfig::from_env()?;
    log_configuration(&config);

    if !config.session.secret_from_env {
        tracing::warn!("⚠️ SESSION_SECRET not set, generated a random one. Sessions will not survive a restart");
    }

    // Postgres when configured, otherwise everything lives in memory
    let db_pool = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::connect(url).await?;
            tracing::info!("✅ Connected to PostgreSQL");
            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, accounts are kept in memory only");
            None
        }
    };

    let users: Arc<dyn UserStore> = match &db_pool {
        Some(pool) => Arc::new(PgUserStore::new(pool.clone())),
        None => Arc::new(InMemoryUserStore::new()),
    };
    let flashcards: Arc<dyn FlashcardStore> = match &db_pool {
        Some(pool) => Arc::new(PgFlashcardStore::new(pool.clone())),
        None => Arc::new(InMemoryFlashcardStore::new()),
    };

    let gateway: Arc<dyn InferenceGateway> = match config.inference.api_token.clone() {
        Some(token) => {
            tracing::info!("✅ Inference client initialized ({})", config.inference.model);
            Arc::new(HuggingFaceClient::new(token, &config.inference))
        }
        None => {
            tracing::warn!("HF_API_TOKEN not set, chat replies will report the missing configuration");
            Arc::new(UnconfiguredGateway)
        }
    };

    let authenticator = Arc::new(SessionAuthenticator::new(users.clone(), &config));
    let conversations = Arc::new(ConversationManager::new(
        gateway,
        config.inference.model.clone(),
        config.assistant_name.clone(),
        config.history_capacity,
    ));

    let port = config.port;
    let shared_state = Arc::new(AppState {
        config,
        users,
        flashcards,
        authenticator,
        conversations,
        db_pool,
    });

    let app = chat_assistant::app(shared_state);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,chat_assistant=trace,sqlx=info,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,chat_assistant=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    // JSON for log aggregation, human-readable otherwise
    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;

    tracing::info!("🤖 Chat assistant starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Build mode: {}", if cfg!(debug_assertions) { "development" } else { "production" });
    tracing::info!("Log level: {}", log_level);

    Ok(())
}

fn log_configuration(config: &AppConfig) {
    let flag = |on: bool| if on { "✅" } else { "❌" };
    tracing::info!(
        "Configuration - Database: {}, Inference: {}, Administrator: {}, History capacity: {}",
        flag(config.database_url.is_some()),
        flag(config.inference.api_token.is_some()),
        flag(config.admin_email.is_some()),
        config.history_capacity
    );
}
