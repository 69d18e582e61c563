//! HTTP front-end: `GET /link?url=…[&ne=…][&features=true][&candidates=true]`
//! returns the linker's JSON envelope. Requests are independent; no state is
//! shared across them beyond the configured endpoints and model weights.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use krantlink_core::linker::LinkerOptions;
use krantlink_core::{EntityLinker, LinkerSettings, Remotes};
use krantlink_model::Model;

struct AppState {
    remotes: Remotes,
    model: Arc<dyn Model>,
    settings: LinkerSettings,
}

#[derive(Debug, Deserialize)]
struct LinkParams {
    url: String,
    ne: Option<String>,
    #[serde(default)]
    features: bool,
    #[serde(default)]
    candidates: bool,
    #[serde(default)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = LinkerSettings::load();
    let model_path = settings
        .model_path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no model configured; set MODEL_PATH"))?;
    let model: Arc<dyn Model> = Arc::from(krantlink_model::load_model(&model_path)?);
    tracing::info!(model = %model_path.display(), features = model.schema().len(), "model loaded");

    let state = Arc::new(AppState {
        remotes: Remotes::from_settings(&settings),
        model,
        settings,
    });

    let app = axum::Router::new()
        .route("/link", axum::routing::get(link))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5002);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn link(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LinkParams>,
) -> Result<Json<krantlink_core::LinkResponse>, (StatusCode, String)> {
    let options = LinkerOptions {
        debug: params.debug,
        include_features: params.features,
        include_candidates: params.candidates,
        ..Default::default()
    };
    let linker = EntityLinker::new(
        state.remotes.clone(),
        state.model.clone(),
        &state.settings,
        options,
    );

    match linker.link(&params.url, params.ne.as_deref()).await {
        Ok(response) => Ok(Json(response)),
        // Debug mode propagates the raw error to the caller
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
