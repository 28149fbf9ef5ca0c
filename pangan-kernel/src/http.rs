/**
 * API REST PANGAN - Serveur HTTP du kernel
 *
 * RÔLE :
 * Expose les lectures simulées au dashboard (polling toutes les 5s)
 * et quelques routes d'exploitation.
 *
 * ROUTES :
 * - GET /api/sensor-data   : 24 lectures + lecture courante + horodatage
 * - GET /health            : "ok"
 * - GET /system/health     : uptime, compteurs, mémoire, mode RNG
 * - GET /contracts[/{name}]: contrats JSON des réponses
 *
 * ERREURS :
 * Toute erreur de génération devient un 500 générique { "error": ... },
 * sans retry ni résultat partiel.
 */

use crate::contracts::{Contract, ContractRegistry};
use crate::health::{HealthTracker, KernelHealth};
use crate::models::{ErrorBody, SensorDataResponse};
use crate::synth::{SynthError, Synthesizer};
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use std::time::Instant;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Clone)]
pub struct AppState {
    pub synth: Synthesizer,
    pub health: HealthTracker,
    pub contracts: Arc<ContractRegistry>,
}

/// Erreur côté API : le détail est loggé, jamais renvoyé au client
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("sensor data generation failed: {0}")]
    Generation(#[from] SynthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: "Failed to generate sensor data".into() };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let resp = next.run(req).await;

    tracing::debug!(
        %method,
        %path,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "[http] request"
    );
    resp
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/api/sensor-data", get(get_sensor_data))
        .route("/contracts", get(list_contracts))
        .route("/contracts/{name}", get(get_contract))
        .with_state(app_state)
        .layer(middleware::from_fn(log_requests))
}

fn build_sensor_data(synth: &Synthesizer, now: OffsetDateTime) -> Result<SensorDataResponse, SynthError> {
    let history = synth.generate(now)?;
    let timestamp = now.format(&Rfc3339)?;
    SensorDataResponse::from_history(&history, timestamp).ok_or(SynthError::EmptyHistory)
}

// GET /api/sensor-data
async fn get_sensor_data(State(app): State<AppState>) -> Result<Json<SensorDataResponse>, ApiError> {
    match build_sensor_data(&app.synth, OffsetDateTime::now_utc()) {
        Ok(resp) => {
            app.health.record_served();
            Ok(Json(resp))
        }
        Err(e) => {
            tracing::error!("[http] error generating sensor data: {e}");
            app.health.record_failure();
            Err(ApiError::from(e))
        }
    }
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health.get_health(app.synth.rng_mode()))
}

// GET /contracts
async fn list_contracts(State(app): State<AppState>) -> Json<Vec<String>> {
    Json(app.contracts.list_contracts())
}

// GET /contracts/{name}
async fn get_contract(
    State(app): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Contract>, StatusCode> {
    match app.contracts.get_contract(&name) {
        Some(contract) => Ok(Json(contract.clone())),
        None => Err(StatusCode::NOT_FOUND),
    }
}
