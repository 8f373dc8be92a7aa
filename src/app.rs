use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::codec;
use crate::config::GatewayArgs;
use crate::store::{FIRST_DATA_ROW, FileRange, MemoryRange, RangeStore};

pub struct AppState {
    store: Box<dyn RangeStore>,
}

/// Router serving the gateway on `route`, backed by `store`.
pub fn router(store: Box<dyn RangeStore>, route: &str) -> Router {
    let route = if route.starts_with('/') {
        route.to_string()
    } else {
        format!("/{route}")
    };
    let app_state = Arc::new(AppState { store });

    Router::new()
        .route(&route, any(sheets))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn run(args: GatewayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store: Box<dyn RangeStore> = match &args.store {
        Some(path) => {
            let range = FileRange::open(path)?;
            log::info!("serving range file {}", range.path().display());
            Box::new(range)
        }
        None => {
            log::info!("no store file given, keeping the range in memory");
            Box::new(MemoryRange::with_header())
        }
    };

    let app = router(store, &args.route);

    let listener = TcpListener::bind(args.bind).await?;
    log::info!("gateway listening on http://{}{}", args.bind, args.route);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn sheets(State(state): State<Arc<AppState>>, method: Method, body: Bytes) -> Response {
    match method {
        Method::GET => read_range(&state),
        Method::POST => write_range(&state, &body),
        _ => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response(),
    }
}

fn read_range(state: &AppState) -> Response {
    match state.store.read_rows() {
        Ok(rows) => Json(codec::from_range_rows(&rows)).into_response(),
        Err(e) => {
            log::error!("reading range failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn write_range(state: &AppState, body: &[u8]) -> Response {
    let object = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "request body must be a JSON object".to_string(),
            );
        }
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("invalid JSON: {e}")),
    };

    match store_object(state, &object) {
        Ok(count) => {
            log::debug!("wrote {count} rows");
            Json(json!({ "success": true })).into_response()
        }
        Err(e) => {
            log::error!("writing range failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn store_object(
    state: &AppState,
    object: &Map<String, Value>,
) -> Result<usize, crate::store::StoreError> {
    let rows = codec::to_range_rows(object);
    let count = rows.len();
    state.store.write_rows(FIRST_DATA_ROW, rows)?;
    Ok(count)
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
