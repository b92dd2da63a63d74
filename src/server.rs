//! HTTP viewer API composing the aggregation engine.
//!
//! GET /api/health - health check for dev tooling.
//! GET /api/nodes - fleet node list with capacity summary.
//! GET /api/node/:name/workloads - annotated, sortable workload table.
//! GET /api/node/:name/price - windowed cost statistics.
//!
//! Handlers stay thin: each resolves data through the fetch
//! collaborator and hands it to [`compose_node_view`] or the price
//! aggregator. A price fetch failure degrades the workload view to an
//! empty history (costs render as 0) rather than failing the table.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::client::{FetchError, FleetClient, NodeIdentity, NodeIdentitySource};
use crate::elapsed::format_span;
use crate::labels::discover_labels;
use crate::model::{summarize_fleet, FleetSummary, Node, PricePoint, PriceWindow, UtilizationPair, Workload};
use crate::price::{attribute_cost, PriceSeries};
use crate::sort::{sort_rows, SortDirection};
use crate::utilization::annotate;

/// Application state shared across handlers.
pub struct AppState {
    pub client: FleetClient,
    /// Fractional second digits for duration rendering.
    pub precision: usize,
}

/// Server configuration.
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8060 }
    }
}

/// Start the HTTP server.
pub async fn run_server(state: AppState, config: ServerConfig) -> anyhow::Result<()> {
    let state = Arc::new(state);

    let app = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/nodes", get(nodes_handler))
        .route("/api/node/:name/workloads", get(workloads_handler))
        .route("/api/node/:name/price", get(price_handler))
        // The dashboard UI is served cross-origin.
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "viewer API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// View errors with appropriate HTTP status codes.
enum ViewError {
    /// The registry knows no node by this name.
    NodeNotFound(String),
    /// The registry or a node agent could not be reached.
    Upstream(FetchError),
}

impl From<FetchError> for ViewError {
    fn from(err: FetchError) -> Self {
        ViewError::Upstream(err)
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ViewError::NodeNotFound(name) => {
                (StatusCode::NOT_FOUND, format!("unknown node: {name}"))
            }
            ViewError::Upstream(err) => {
                tracing::warn!(error = %err, "upstream fetch failed");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
        };
        (status, message).into_response()
    }
}

// --- Handlers ---

/// GET /api/health - health check endpoint for dev tooling.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// GET /api/nodes - fleet listing with summed capacity.
async fn nodes_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NodesResponse>, ViewError> {
    let nodes = state.client.list_nodes().await?;
    Ok(Json(NodesResponse {
        summary: summarize_fleet(&nodes),
        nodes,
    }))
}

#[derive(Serialize)]
struct NodesResponse {
    #[serde(rename = "Summary")]
    summary: FleetSummary,
    #[serde(rename = "Nodes")]
    nodes: Vec<Node>,
}

/// GET /api/node/:name/workloads - the annotated workload table.
#[derive(Deserialize)]
struct WorkloadsQuery {
    #[serde(default)]
    sort: Option<String>,
    #[serde(default)]
    dir: Option<SortDirection>,
}

async fn workloads_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<WorkloadsQuery>,
) -> Result<Json<NodeViewResponse>, ViewError> {
    let mut node = find_node(&state.client, &name).await?;

    // Workloads and price history are independent fetches for the
    // same node; run them concurrently.
    let (workloads, price) = tokio::join!(
        state.client.fetch_workloads(&node.address),
        state.client.fetch_price_window(&node.address, None, None),
    );
    let fetch = workloads?;

    // The historical agent reports node identity in the response
    // headers; prefer it over the registry's body-sourced record.
    let identity = match fetch.identity {
        Some(identity) => Some(identity),
        None => NodeIdentity::parse(NodeIdentitySource::Body(&node))?,
    };
    if let Some(identity) = identity {
        identity.apply(&mut node);
    }

    // A failed price fetch must not take the table down; the view
    // degrades to zero attributed cost.
    let history = match price {
        Ok(fetched) => fetched.window.history,
        Err(err) => {
            tracing::warn!(node = %node.name, error = %err, "price fetch failed, rendering without cost");
            Vec::new()
        }
    };

    let view = compose_node_view(
        node,
        fetch.workloads,
        &history,
        query.sort.as_deref(),
        query.dir.unwrap_or_default(),
        state.precision,
    );
    Ok(Json(view))
}

/// GET /api/node/:name/price - windowed cost statistics.
#[derive(Deserialize)]
struct PriceQuery {
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
}

async fn price_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceResponse>, ViewError> {
    let node = find_node(&state.client, &name).await?;

    let fetched = state
        .client
        .fetch_price_window(&node.address, query.start.as_deref(), query.end.as_deref())
        .await?;

    let duration = PriceSeries::new(fetched.window.history.clone()).duration();
    Ok(Json(PriceResponse {
        window: fetched.window,
        duration,
        effective_start: fetched.effective_start_nanos,
    }))
}

#[derive(Serialize)]
struct PriceResponse {
    #[serde(flatten)]
    window: PriceWindow,
    #[serde(rename = "Duration")]
    duration: String,
    #[serde(rename = "EffectiveStart", skip_serializing_if = "Option::is_none")]
    effective_start: Option<i64>,
}

async fn find_node(client: &FleetClient, name: &str) -> Result<Node, ViewError> {
    let nodes = client.list_nodes().await?;
    nodes
        .into_iter()
        .find(|n| n.name == name)
        .ok_or_else(|| ViewError::NodeNotFound(name.to_string()))
}

// --- View composition ---

/// One table row: the annotated workload plus rendered durations.
/// The `*Live` flags tell the presentation layer which durations are
/// open-ended and need a ticking refresh.
#[derive(Debug, Serialize)]
pub struct WorkloadRow {
    #[serde(flatten)]
    pub workload: Workload,
    #[serde(rename = "RunTime")]
    pub run_time: String,
    #[serde(rename = "RunTimeLive")]
    pub run_time_live: bool,
    #[serde(rename = "AllocTime")]
    pub alloc_time: String,
    #[serde(rename = "AllocTimeLive")]
    pub alloc_time_live: bool,
}

/// The full per-node view the dashboard renders.
#[derive(Debug, Serialize)]
pub struct NodeViewResponse {
    #[serde(rename = "Node")]
    pub node: Node,
    /// Dynamically discovered label columns, sorted.
    #[serde(rename = "Labels")]
    pub labels: Vec<String>,
    #[serde(rename = "CPU")]
    pub cpu: UtilizationPair,
    #[serde(rename = "Memory")]
    pub memory: UtilizationPair,
    #[serde(rename = "Workloads")]
    pub workloads: Vec<WorkloadRow>,
}

/// Compose the per-node dashboard view: utilization annotation, label
/// discovery, cost attribution, sorting, and duration rendering.
///
/// Pure with respect to its inputs apart from reading the clock for
/// open-ended durations.
pub fn compose_node_view(
    node: Node,
    mut workloads: Vec<Workload>,
    history: &[PricePoint],
    sort_key: Option<&str>,
    direction: SortDirection,
    precision: usize,
) -> NodeViewResponse {
    let utilization = annotate(&node, &mut workloads);
    let labels = discover_labels(&workloads);

    for workload in workloads.iter_mut() {
        workload.price = attribute_cost(history, workload.start);
    }

    if let Some(key) = sort_key {
        sort_rows(&mut workloads, key, direction);
    }

    let rows = workloads
        .into_iter()
        .map(|workload| {
            let (run_time, run_time_live) =
                format_span(workload.start, workload.stop, precision);
            let (alloc_time, alloc_time_live) =
                format_span(workload.create, workload.destroy, precision);
            WorkloadRow {
                workload,
                run_time,
                run_time_live,
                alloc_time,
                alloc_time_live,
            }
        })
        .collect();

    NodeViewResponse {
        node,
        labels,
        cpu: utilization.cpu,
        memory: utilization.memory,
        workloads: rows,
    }
}
