//! Health check endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;
use crate::store::HealthProbe;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub enum HealthResult {
    Up,
    Down,
}

impl From<bool> for HealthResult {
    fn from(healthy: bool) -> Self {
        if healthy {
            HealthResult::Up
        } else {
            HealthResult::Down
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthComponent {
    pub name: &'static str,
    pub health: HealthResult,
}

#[derive(Debug, Serialize)]
pub struct HealthAggregation {
    pub health: HealthResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<HealthComponent>,
}

/// Liveness probe: the process is up and serving.
pub async fn health() -> Json<HealthAggregation> {
    Json(HealthAggregation {
        health: HealthResult::Up,
        components: Vec::new(),
    })
}

/// Readiness probe: fans out to every store and aggregates.
/// Down if any single component is down.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthAggregation>) {
    let (accounts, devices, modules) = tokio::join!(
        state.accounts.health(),
        state.devices.health(),
        state.modules.health(),
    );

    let components: Vec<HealthComponent> = [accounts, devices, modules]
        .into_iter()
        .map(|HealthProbe { name, healthy }| HealthComponent {
            name,
            health: healthy.into(),
        })
        .collect();

    let all_up = components
        .iter()
        .all(|component| component.health == HealthResult::Up);

    let status = if all_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthAggregation {
            health: all_up.into(),
            components,
        }),
    )
}
