//! Vaani Server
//!
//! HTTP boundary for the voice assistant: transcription, the dialogue
//! agent, speech synthesis, the scheme catalog and session inspection.
//! This is a library crate; the server is started via `start_server()`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, http::Method, routing::get, Json, Router};
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use vaani_core::agent::ExecutorServices;
use vaani_core::config::{AgentSettings, SpeechProvider};
use vaani_core::schemes::{InMemorySubmissions, SchemeCatalog};
use vaani_core::speech::{self, SpeechRecognizer, SpeechSynthesizer};
use vaani_core::{DialogueOrchestrator, SessionStore, VaaniConfig};

pub mod error;
pub mod routes;
pub mod types;

use error::AppError;

const SESSION_LOCK_MAX_ENTRIES: usize = 1000;
const SESSION_LOCK_MAX_AGE: Duration = Duration::from_secs(3600);

/// Configuration for starting the server.
pub struct ServerConfig {
    /// Port to listen on (default: 8000).
    pub port: u16,
    pub app: VaaniConfig,
}

impl ServerConfig {
    pub fn new(app: VaaniConfig) -> Self {
        Self {
            port: app.server.port,
            app,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub orchestrator: Arc<DialogueOrchestrator>,
    pub catalog: Arc<SchemeCatalog>,
    pub submissions: Arc<InMemorySubmissions>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub settings: Arc<AgentSettings>,
    /// Scratch directory for uploads and synthesized audio.
    pub tmp_dir: Arc<PathBuf>,
    pub speech_enabled: bool,
    /// Per-session locks to prevent concurrent dialogue turns on the same session.
    pub session_locks: Arc<RwLock<HashMap<String, (Arc<Mutex<()>>, Instant)>>>,
}

impl AppState {
    pub fn new(
        config: &VaaniConfig,
        catalog: Arc<SchemeCatalog>,
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let store = SessionStore::new();
        let submissions = Arc::new(InMemorySubmissions::new());
        let services =
            ExecutorServices::new(catalog.clone(), catalog.clone(), submissions.clone());
        let orchestrator =
            DialogueOrchestrator::from_settings(store.clone(), &config.agent, services);

        Self {
            store,
            orchestrator: Arc::new(orchestrator),
            catalog,
            submissions,
            recognizer,
            synthesizer,
            settings: Arc::new(config.agent.clone()),
            tmp_dir: Arc::new(config.server.tmp_dir.clone()),
            speech_enabled: config.speech.provider == SpeechProvider::Http,
            session_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Take the turn lock for a session, or fail if another turn holds it.
    pub async fn lock_session(&self, session_id: &str) -> Result<OwnedMutexGuard<()>, AppError> {
        let session_lock = {
            let mut locks = self.session_locks.write().await;
            if locks.len() > SESSION_LOCK_MAX_ENTRIES {
                locks.retain(|_, (lock, created_at)| {
                    created_at.elapsed() < SESSION_LOCK_MAX_AGE || Arc::strong_count(lock) > 1
                });
            }
            let (lock, _) = locks
                .entry(session_id.to_string())
                .or_insert_with(|| (Arc::new(Mutex::new(())), Instant::now()));
            lock.clone()
        };
        session_lock
            .try_lock_owned()
            .map_err(|_| AppError::Conflict(format!("Session {} is busy", session_id)))
    }
}

/// Build state from configuration: catalog, speech adapters, orchestrator.
pub fn build_state(config: &VaaniConfig) -> anyhow::Result<AppState> {
    let catalog = SchemeCatalog::load(config.resolved_schemes_path().as_deref())?;
    tracing::info!(schemes = catalog.schemes().len(), "Scheme catalog ready");

    let recognizer = speech::build_recognizer(&config.speech)?;
    let synthesizer = speech::build_synthesizer(&config.speech)?;

    Ok(AppState::new(
        config,
        Arc::new(catalog),
        recognizer,
        synthesizer,
    ))
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .nest("/api", routes::api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Vaani server and block until shutdown.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let state = build_state(&config.app)?;
    vaani_core::paths::ensure_dir(&state.tmp_dir)?;
    let app = build_router(state);

    tracing::info!("Vaani server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: HashMap::from([
            ("agent".to_string(), true),
            ("speech".to_string(), state.speech_enabled),
        ]),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    features: HashMap<String, bool>,
}
