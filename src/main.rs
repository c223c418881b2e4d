use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use turnero::config::AppConfig;
use turnero::db;
use turnero::handlers;
use turnero::services::ai::groq::GroqProvider;
use turnero::services::ai::ollama::OllamaProvider;
use turnero::services::ai::LlmProvider;
use turnero::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "groq" => {
            anyhow::ensure!(
                !config.groq_api_key.is_empty(),
                "GROQ_API_KEY must be set when LLM_PROVIDER=groq"
            );
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(GroqProvider::new(
                config.groq_api_key.clone(),
                config.groq_model.clone(),
            ))
        }
        _ => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ))
        }
    };

    let (booking_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        llm,
        booking_tx,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/tenants", post(handlers::admin::create_tenant))
        .route(
            "/api/t/:tenant/services",
            get(handlers::admin::get_services).post(handlers::admin::add_service),
        )
        .route("/api/t/:tenant/slots", get(handlers::admin::get_slots))
        .route(
            "/api/t/:tenant/appointments",
            get(handlers::admin::get_appointments).post(handlers::admin::create_appointment),
        )
        .route(
            "/api/t/:tenant/appointments/:id/status",
            post(handlers::admin::update_appointment_status),
        )
        .route(
            "/api/t/:tenant/patients/:patient_id/risk",
            get(handlers::admin::get_risk_profile),
        )
        .route(
            "/api/t/:tenant/events",
            get(handlers::events::booking_events),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
