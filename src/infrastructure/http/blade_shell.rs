//! Generic blade HTTP shell (`spec.md` §4.4), grounded in `status` /
//! `load_intent` / `app_serializer` in `blades/__init__.py`.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::domain::models::{BladeState, Intent, NodeDescriptor, StateValue, Topology};

/// Per-process shared state behind the shell. `extra` is the blade's
/// process-local key/value store surfaced verbatim by `GET /`.
pub struct AppState {
    pub blade: NodeDescriptor,
    pub topology: Topology,
    pub extra: RwLock<BTreeMap<String, StateValue>>,
    /// The per-kind override invoked by `POST /`, if this blade kind
    /// customizes intent reception (`request.app['load_intent']` in the
    /// source). `None` means "echo the node descriptor back", the
    /// upstream fallback when no override is registered.
    pub on_intent: Option<Box<dyn Fn(&Intent, &AppState) -> serde_json::Value + Send + Sync>>,
}

impl AppState {
    pub fn new(blade: NodeDescriptor, topology: Topology) -> Self {
        Self {
            blade,
            topology,
            extra: RwLock::new(BTreeMap::new()),
            on_intent: None,
        }
    }

    pub fn with_intent_handler(
        mut self,
        handler: impl Fn(&Intent, &AppState) -> serde_json::Value + Send + Sync + 'static,
    ) -> Self {
        self.on_intent = Some(Box::new(handler));
        self
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(status).post(load_intent))
        .with_state(state)
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let extra = state.extra.read().expect("state lock poisoned").clone();
    Json(BladeState {
        blade: state.blade.clone(),
        topology: state.topology.clone(),
        extra,
    })
}

async fn load_intent(
    State(state): State<Arc<AppState>>,
    Json(intent): Json<Intent>,
) -> impl IntoResponse {
    if let Some(handler) = &state.on_intent {
        Json(handler(&intent, &state))
    } else {
        Json(serde_json::to_value(&state.blade).unwrap_or(serde_json::Value::Null))
    }
}
