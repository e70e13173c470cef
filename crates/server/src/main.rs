// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod live;

use axum::{
    Json, Router,
    extract::{FromRef, Path, Query, State as AxumState},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use indexmap::IndexMap;
use live::{LiveEventBroadcaster, live_events_handler};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use zonemap::{RegionSummary, ShareDistribution, ZoneEntry, ZoneStatistics};
use zonemap_api::{
    Actor, AddZoneRequest, ApiError, BackupMetadata, ChangeHistory, MaintenanceOutcome,
    MunicipalityInfo, MutationOutcome, ReassignManyRequest, ReassignZoneRequest,
    RecolorZoneRequest, RegionListing, RegionOverview, RegisterRegionRequest,
    RegistrationOutcome, RenameZoneRequest, ReportFormat, TerritoryEngine, UnassignRequest,
};
use zonemap_domain::ZoneName;

/// Zone map server - HTTP and WebSocket transport for the zone map engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding `regions.json` and one sub-directory per region
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: IpAddr,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The engine over every region in the data directory.
    engine: Arc<TerritoryEngine>,
    /// Fan-out of committed changes to live clients.
    broadcaster: Arc<LiveEventBroadcaster>,
}

impl FromRef<AppState> for Arc<LiveEventBroadcaster> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.broadcaster)
    }
}

/// A mutation body with the operator who sent it.
///
/// The actor is a free-form label; without one, changes are attributed to
/// the system.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct WithActor<T> {
    /// Operator label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actor: Option<String>,
    /// The request itself.
    #[serde(flatten)]
    request: T,
}

impl<T> WithActor<T> {
    fn actor(&self) -> Actor {
        self.actor
            .as_deref()
            .map_or_else(Actor::system, Actor::operator)
    }
}

/// Body of a snapshot request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct SnapshotApiRequest {
    /// Optional label appended to the backup id.
    #[serde(default)]
    label: Option<String>,
}

/// Query for zone members.
#[derive(Debug, Clone, Deserialize)]
struct ZoneMembersQuery {
    /// Zone name.
    zone: String,
}

/// Query for the change history.
#[derive(Debug, Clone, Deserialize)]
struct ChangesQuery {
    /// Maximum number of events, newest first.
    #[serde(default)]
    limit: Option<usize>,
}

/// Query for the change report.
#[derive(Debug, Clone, Deserialize)]
struct ReportQuery {
    /// `json` (default) or `csv`.
    #[serde(default)]
    format: ReportFormat,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Stable error kind.
    kind: String,
    /// Error message.
    message: String,
}

/// HTTP error wrapper.
#[derive(Debug)]
struct HttpError {
    /// HTTP status code.
    status: StatusCode,
    /// Stable error kind.
    kind: &'static str,
    /// Error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            kind: self.kind.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MalformedFile { .. }
            | ApiError::Persistence { .. }
            | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(kind = err.kind(), error = %err, "Request failed");
        }
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Renders a text document with its content type.
fn text_response(content_type: &'static str, body: String) -> Response {
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// Handler for GET `/regions`.
async fn handle_list_regions(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<Vec<RegionListing>>, HttpError> {
    Ok(Json(app_state.engine.list_regions()?))
}

/// Handler for POST `/regions`.
///
/// Registers a region (seeding placeholder files) or reactivates one.
async fn handle_register_region(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegisterRegionRequest>,
) -> Result<Json<RegistrationOutcome>, HttpError> {
    info!(region = %req.code, "Handling register_region request");
    let outcome: RegistrationOutcome = app_state.engine.register_region(&req)?;
    app_state.broadcaster.notify(&outcome.notification);
    Ok(Json(outcome))
}

/// Handler for POST `/regions/{code}/deactivate`.
async fn handle_deactivate_region(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, HttpError> {
    info!(region = %code, "Handling deactivate_region request");
    app_state.engine.deactivate_region(&code)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST `/regions/{code}/select`.
async fn handle_select_region(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RegionOverview>, HttpError> {
    Ok(Json(app_state.engine.select_region(&code)?))
}

/// Handler for POST `/regions/{code}/reload`.
async fn handle_reload_region(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RegionOverview>, HttpError> {
    info!(region = %code, "Handling reload_region request");
    Ok(Json(app_state.engine.reload_region(&code)?))
}

/// Handler for GET `/regions/{code}/map`.
///
/// Returns the boundaries as GeoJSON with zone, color and metrics.
async fn handle_map_view(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Value>, HttpError> {
    Ok(Json(app_state.engine.map_view(&code)?))
}

/// Handler for GET `/regions/{code}/zones`.
async fn handle_list_zones(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<ZoneEntry>>, HttpError> {
    Ok(Json(app_state.engine.zones(&code)?))
}

/// Handler for POST `/regions/{code}/zones`.
async fn handle_add_zone(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
    Json(req): Json<WithActor<AddZoneRequest>>,
) -> Result<Json<MutationOutcome>, HttpError> {
    info!(region = %code, zone = %req.request.zone, "Handling add_zone request");
    let outcome: MutationOutcome = app_state
        .engine
        .add_zone(&code, &req.request, &req.actor())?;
    app_state.broadcaster.notify(&outcome.notification);
    Ok(Json(outcome))
}

/// Handler for POST `/regions/{code}/zones/rename`.
async fn handle_rename_zone(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
    Json(req): Json<WithActor<RenameZoneRequest>>,
) -> Result<Json<MutationOutcome>, HttpError> {
    info!(
        region = %code,
        from = %req.request.from,
        to = %req.request.to,
        "Handling rename_zone request"
    );
    let outcome: MutationOutcome = app_state
        .engine
        .rename_zone(&code, &req.request, &req.actor())?;
    app_state.broadcaster.notify(&outcome.notification);
    Ok(Json(outcome))
}

/// Handler for POST `/regions/{code}/zones/color`.
async fn handle_recolor_zone(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
    Json(req): Json<WithActor<RecolorZoneRequest>>,
) -> Result<Json<MutationOutcome>, HttpError> {
    info!(region = %code, zone = %req.request.zone, "Handling recolor_zone request");
    let outcome: MutationOutcome = app_state
        .engine
        .recolor_zone(&code, &req.request, &req.actor())?;
    app_state.broadcaster.notify(&outcome.notification);
    Ok(Json(outcome))
}

/// Handler for GET `/regions/{code}/zones/members?zone=`.
async fn handle_zone_members(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ZoneMembersQuery>,
) -> Result<Json<Vec<MunicipalityInfo>>, HttpError> {
    Ok(Json(app_state.engine.zone_members(&code, &query.zone)?))
}

/// Handler for GET `/regions/{code}/stats`.
async fn handle_stats(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<IndexMap<ZoneName, ZoneStatistics>>, HttpError> {
    Ok(Json(app_state.engine.stats(&code)?))
}

/// Handler for GET `/regions/{code}/stats/summary`.
async fn handle_region_summary(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RegionSummary>, HttpError> {
    Ok(Json(app_state.engine.region_summary(&code)?))
}

/// Handler for GET `/regions/{code}/stats/share`.
async fn handle_share_distribution(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ShareDistribution>, HttpError> {
    Ok(Json(app_state.engine.share_distribution(&code)?))
}

/// Handler for GET `/regions/{code}/municipalities`.
async fn handle_municipalities(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<MunicipalityInfo>>, HttpError> {
    Ok(Json(app_state.engine.municipalities(&code)?))
}

/// Handler for POST `/regions/{code}/reassign`.
async fn handle_reassign_zone(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
    Json(req): Json<WithActor<ReassignZoneRequest>>,
) -> Result<Json<MutationOutcome>, HttpError> {
    info!(
        region = %code,
        municipality = %req.request.municipality_id,
        zone = %req.request.zone,
        "Handling reassign_zone request"
    );
    let outcome: MutationOutcome = app_state
        .engine
        .reassign_zone(&code, &req.request, &req.actor())?;
    app_state.broadcaster.notify(&outcome.notification);
    Ok(Json(outcome))
}

/// Handler for POST `/regions/{code}/reassign_many`.
async fn handle_reassign_many(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
    Json(req): Json<WithActor<ReassignManyRequest>>,
) -> Result<Json<MutationOutcome>, HttpError> {
    info!(
        region = %code,
        count = req.request.municipality_ids.len(),
        zone = %req.request.zone,
        "Handling reassign_many request"
    );
    let outcome: MutationOutcome = app_state
        .engine
        .reassign_many(&code, &req.request, &req.actor())?;
    app_state.broadcaster.notify(&outcome.notification);
    Ok(Json(outcome))
}

/// Handler for POST `/regions/{code}/unassign`.
async fn handle_unassign(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
    Json(req): Json<WithActor<UnassignRequest>>,
) -> Result<Json<MutationOutcome>, HttpError> {
    info!(
        region = %code,
        municipality = %req.request.municipality_id,
        "Handling unassign request"
    );
    let outcome: MutationOutcome =
        app_state
            .engine
            .unassign_municipality(&code, &req.request, &req.actor())?;
    app_state.broadcaster.notify(&outcome.notification);
    Ok(Json(outcome))
}

/// Handler for GET `/regions/{code}/changes?limit=`.
async fn handle_change_history(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ChangesQuery>,
) -> Result<Json<ChangeHistory>, HttpError> {
    Ok(Json(app_state.engine.change_history(&code, query.limit)?))
}

/// Handler for GET `/regions/{code}/changes/report?format=`.
async fn handle_change_report(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, HttpError> {
    let body: String = app_state.engine.change_report(&code, query.format)?;
    Ok(text_response(query.format.content_type(), body))
}

/// Handler for GET `/regions/{code}/export`.
///
/// Returns the entity table with current zones as CSV.
async fn handle_export(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Response, HttpError> {
    let body: String = app_state.engine.export_entity_table(&code)?;
    Ok(text_response(ReportFormat::Csv.content_type(), body))
}

/// Handler for GET `/regions/{code}/backups`.
async fn handle_list_backups(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<BackupMetadata>>, HttpError> {
    Ok(Json(app_state.engine.list_backups(&code)?))
}

/// Handler for POST `/regions/{code}/backups`.
async fn handle_snapshot(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
    Json(req): Json<SnapshotApiRequest>,
) -> Result<Json<BackupMetadata>, HttpError> {
    info!(region = %code, "Handling snapshot request");
    Ok(Json(
        app_state.engine.snapshot(&code, req.label.as_deref())?,
    ))
}

/// Handler for POST `/regions/{code}/backups/{backup_id}/restore`.
async fn handle_restore(
    AxumState(app_state): AxumState<AppState>,
    Path((code, backup_id)): Path<(String, String)>,
) -> Result<Json<MaintenanceOutcome>, HttpError> {
    info!(region = %code, backup = %backup_id, "Handling restore request");
    let outcome: MaintenanceOutcome = app_state.engine.restore(&code, &backup_id)?;
    app_state.broadcaster.notify(&outcome.notification);
    Ok(Json(outcome))
}

/// Handler for POST `/regions/{code}/reset`.
async fn handle_reset(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<MaintenanceOutcome>, HttpError> {
    info!(region = %code, "Handling reset request");
    let outcome: MaintenanceOutcome = app_state.engine.reset_region(&code)?;
    app_state.broadcaster.notify(&outcome.notification);
    Ok(Json(outcome))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/regions", get(handle_list_regions).post(handle_register_region))
        .route("/regions/{code}/select", post(handle_select_region))
        .route("/regions/{code}/reload", post(handle_reload_region))
        .route("/regions/{code}/deactivate", post(handle_deactivate_region))
        .route("/regions/{code}/map", get(handle_map_view))
        .route(
            "/regions/{code}/zones",
            get(handle_list_zones).post(handle_add_zone),
        )
        .route("/regions/{code}/zones/rename", post(handle_rename_zone))
        .route("/regions/{code}/zones/color", post(handle_recolor_zone))
        .route("/regions/{code}/zones/members", get(handle_zone_members))
        .route("/regions/{code}/stats", get(handle_stats))
        .route("/regions/{code}/stats/summary", get(handle_region_summary))
        .route("/regions/{code}/stats/share", get(handle_share_distribution))
        .route("/regions/{code}/municipalities", get(handle_municipalities))
        .route("/regions/{code}/reassign", post(handle_reassign_zone))
        .route("/regions/{code}/reassign_many", post(handle_reassign_many))
        .route("/regions/{code}/unassign", post(handle_unassign))
        .route("/regions/{code}/changes", get(handle_change_history))
        .route("/regions/{code}/changes/report", get(handle_change_report))
        .route("/regions/{code}/export", get(handle_export))
        .route(
            "/regions/{code}/backups",
            get(handle_list_backups).post(handle_snapshot),
        )
        .route(
            "/regions/{code}/backups/{backup_id}/restore",
            post(handle_restore),
        )
        .route("/regions/{code}/reset", post(handle_reset))
        .route("/live", get(live_events_handler))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(data_dir = %args.data_dir.display(), "Initializing zone map server");

    // An unreadable registry is fatal
    let engine: TerritoryEngine = TerritoryEngine::open(&args.data_dir)?;

    let app_state: AppState = AppState {
        engine: Arc::new(engine),
        broadcaster: Arc::new(LiveEventBroadcaster::new()),
    };

    let app: Router = build_router(app_state);

    let addr: SocketAddr = SocketAddr::new(args.bind, args.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::live::LiveEvent;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    /// Creates app state over a temporary data directory with region XX
    /// registered from the seed files.
    fn create_test_app_state(dir: &TempDir) -> AppState {
        let engine: TerritoryEngine = TerritoryEngine::open(dir.path()).unwrap();
        engine
            .register_region(&RegisterRegionRequest {
                code: String::from("XX"),
                name: String::from("Test region"),
            })
            .unwrap();
        AppState {
            engine: Arc::new(engine),
            broadcaster: Arc::new(LiveEventBroadcaster::new()),
        }
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_regions_returns_registered_region() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let app: Router = build_router(create_test_app_state(&dir));

        let response: Response = app.oneshot(get_request("/regions")).await.unwrap();

        assert_eq!(response.status(), HttpStatusCode::OK);
        let body: Value = body_json(response).await;
        assert_eq!(body[0]["code"], "XX");
        assert_eq!(body[0]["active"], true);
    }

    #[tokio::test]
    async fn test_unknown_region_returns_not_found() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let app: Router = build_router(create_test_app_state(&dir));

        let response: Response = app.oneshot(get_request("/regions/YY/map")).await.unwrap();

        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
        let body: Value = body_json(response).await;
        assert_eq!(body["error"], true);
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_map_returns_feature_collection() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let app: Router = build_router(create_test_app_state(&dir));

        let response: Response = app.oneshot(get_request("/regions/XX/map")).await.unwrap();

        assert_eq!(response.status(), HttpStatusCode::OK);
        let body: Value = body_json(response).await;
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"][0]["properties"]["zone"], "Central");
    }

    #[tokio::test]
    async fn test_reassign_to_current_zone_returns_unprocessable() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let app: Router = build_router(create_test_app_state(&dir));

        let response: Response = app
            .oneshot(post_json(
                "/regions/XX/reassign",
                &json!({ "municipality_id": "0000000", "zone": "Central" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = body_json(response).await;
        assert_eq!(body["kind"], "validation_error");
    }

    #[tokio::test]
    async fn test_reassign_commits_and_broadcasts() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let app_state: AppState = create_test_app_state(&dir);
        let mut rx: broadcast::Receiver<LiveEvent> = app_state.broadcaster.subscribe();
        let app: Router = build_router(app_state.clone());

        let response: Response = app
            .clone()
            .oneshot(post_json(
                "/regions/XX/reassign",
                &json!({ "municipality_id": "0000000", "zone": "North", "actor": "ana" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::OK);
        let body: Value = body_json(response).await;
        assert_eq!(body["events"][0]["actor"], "ana");
        assert_eq!(body["events"][0]["new_zone"], "North");
        match rx.try_recv().unwrap() {
            LiveEvent::ZoneReassigned {
                region,
                municipalities,
            } => {
                assert_eq!(region, "XX");
                assert_eq!(municipalities[0].zone, "North");
            }
            other => panic!("Expected ZoneReassigned, got {other:?}"),
        }

        let history: Value = body_json(
            app.oneshot(get_request("/regions/XX/changes?limit=5"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(history["changes"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recolor_with_invalid_color_returns_unprocessable() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let app: Router = build_router(create_test_app_state(&dir));

        let response: Response = app
            .oneshot(post_json(
                "/regions/XX/zones/color",
                &json!({ "zone": "South", "color": "blue" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_add_zone_appears_in_zone_list() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let app: Router = build_router(create_test_app_state(&dir));

        let response: Response = app
            .clone()
            .oneshot(post_json(
                "/regions/XX/zones",
                &json!({ "zone": "Islands", "color": "#00CED1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);

        let zones: Value = body_json(app.oneshot(get_request("/regions/XX/zones")).await.unwrap()).await;
        let names: Vec<&str> = zones
            .as_array()
            .unwrap()
            .iter()
            .map(|z| z["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"Islands"));
        assert_eq!(names.last(), Some(&"unassigned"));
    }

    #[tokio::test]
    async fn test_export_and_report_use_csv_content_type() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let app: Router = build_router(create_test_app_state(&dir));

        let export: Response = app
            .clone()
            .oneshot(get_request("/regions/XX/export"))
            .await
            .unwrap();
        let report: Response = app
            .oneshot(get_request("/regions/XX/changes/report?format=csv"))
            .await
            .unwrap();

        assert_eq!(export.status(), HttpStatusCode::OK);
        assert_eq!(export.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(report.headers()[header::CONTENT_TYPE], "text/csv");
        let bytes = axum::body::to_bytes(export.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8(bytes.to_vec()).unwrap().starts_with("id,name"));
    }

    #[tokio::test]
    async fn test_snapshot_then_restore_unknown_backup() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let app: Router = build_router(create_test_app_state(&dir));

        let snapshot: Response = app
            .clone()
            .oneshot(post_json("/regions/XX/backups", &json!({ "label": "manual" })))
            .await
            .unwrap();
        assert_eq!(snapshot.status(), HttpStatusCode::OK);

        let backups: Value = body_json(
            app.clone()
                .oneshot(get_request("/regions/XX/backups"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(backups.as_array().unwrap().len(), 1);

        let restore: Response = app
            .oneshot(post_json(
                "/regions/XX/backups/19990101_000000/restore",
                &json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(restore.status(), HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deactivated_region_returns_not_found() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let app: Router = build_router(create_test_app_state(&dir));

        let response: Response = app
            .clone()
            .oneshot(post_json("/regions/XX/deactivate", &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::NO_CONTENT);

        let stats: Response = app.oneshot(get_request("/regions/XX/stats")).await.unwrap();
        assert_eq!(stats.status(), HttpStatusCode::NOT_FOUND);
    }
}
