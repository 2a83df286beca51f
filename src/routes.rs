//! HTTP wiring: axum routers for the JSON API and the admin view flow.
//!
//! The routers only parse the request into a [`Route`], hand it to a
//! controller, and turn the outcome back into a response. Every error path
//! funnels through [`AppError`]'s response mapping, so nothing but the
//! structured JSON body ever reaches the client.

use crate::controller::Controller;
use crate::error::AppError;
use crate::state::App;
use crate::transport::{Method, Route};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tower_http::limit::RequestBodyLimitLayer;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Query keys that steer dispatch rather than constrain searches.
const RESERVED_PARAMS: &[&str] = &["action", "subaction", "ajax"];

/// JSON API routes: `/:kind` and `/:kind/:id`, every recognized method.
pub fn api_routes(app: App) -> Router {
    Router::new()
        .route("/:kind", any(api_without_id))
        .route("/:kind/:id", any(api_with_id))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .with_state(app)
}

/// Admin view-preparation routes: run the hook cascade and answer with the
/// resolved template name plus the collected view data. Rendering the
/// template is the caller's concern.
pub fn admin_routes(app: App) -> Router {
    Router::new()
        .route("/:kind", any(admin_kind))
        .route("/:kind/:second", any(admin_second))
        .route("/:kind/:second/:third", any(admin_third))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .with_state(app)
}

fn build_route(
    method: Method,
    action: &str,
    sub_action: &str,
    id: Option<i64>,
    params: HashMap<String, String>,
    body: Option<Value>,
) -> Route {
    let mut query = Map::new();
    let mut ajax = false;
    for (key, value) in params {
        if key == "ajax" {
            ajax = true;
            continue;
        }
        if RESERVED_PARAMS.contains(&key.as_str()) {
            continue;
        }
        query.insert(key, Value::String(value));
    }
    let body = match body {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let mut route = Route::new(method, action).with_sub_action(sub_action);
    route.id = id;
    route.query = query;
    route.body = body;
    route.ajax = ajax;
    route
}

fn token_from(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("auth-token")
        .or_else(|| headers.get("api-key"))
        .and_then(|value| value.to_str().ok())
}

async fn dispatch_api(
    app: App,
    kind: String,
    id: Option<i64>,
    method: axum::http::Method,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Option<Value>,
) -> Response {
    let Some(method) = Method::parse(method.as_str()) else {
        return AppError::MethodNotAllowed(format!("HTTP method ({method}) not allowed"))
            .into_response();
    };
    let action = params.get("action").cloned().unwrap_or_default();
    let sub_action = params.get("subaction").cloned().unwrap_or_default();
    let oracle = app.auth.authenticate(token_from(&headers)).await;
    let route = build_route(method, &action, &sub_action, id, params, body);
    let result = async {
        let mut controller = Controller::model_backed(app, oracle, &kind, route).await?;
        controller.process_api().await
    }
    .await;
    match result {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::debug!(kind = %kind, error = %e, "api dispatch failed");
            e.into_response()
        }
    }
}

async fn api_without_id(
    State(app): State<App>,
    Path(kind): Path<String>,
    method: axum::http::Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> Response {
    dispatch_api(app, kind, None, method, headers, params, body.map(|Json(v)| v)).await
}

async fn api_with_id(
    State(app): State<App>,
    Path((kind, id)): Path<(String, i64)>,
    method: axum::http::Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> Response {
    dispatch_api(app, kind, Some(id), method, headers, params, body.map(|Json(v)| v)).await
}

#[derive(Serialize)]
struct AdminBody {
    /// Template to render, or null when permission gating says render nothing.
    view: Option<String>,
    data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

async fn dispatch_admin(
    app: App,
    kind: String,
    segments: (Option<String>, Option<String>),
    method: axum::http::Method,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Option<Value>,
) -> Response {
    let Some(method) = Method::parse(method.as_str()) else {
        return AppError::MethodNotAllowed(format!("HTTP method ({method}) not allowed"))
            .into_response();
    };
    // /kind/42/edit addresses one record; /kind/search/quick is an action
    // with a sub-action
    let (id, action, sub_action) = match segments {
        (None, _) => (None, String::new(), String::new()),
        (Some(second), third) => match second.parse::<i64>() {
            Ok(id) => (
                Some(id),
                third.unwrap_or_else(|| "view".to_string()),
                String::new(),
            ),
            Err(_) => (None, second, third.unwrap_or_default()),
        },
    };
    let oracle = app.auth.authenticate(token_from(&headers)).await;
    let route = build_route(method, &action, &sub_action, id, params, body);
    let result = async {
        let mut controller = Controller::model_backed(app, oracle, &kind, route).await?;
        if let Some(id) = controller.route().id {
            controller.record_mut().load(id).await?;
        }
        controller.prepare_view().await?;
        let view = controller.view_template()?;
        Ok::<AdminBody, AppError>(AdminBody {
            view,
            data: controller.view_data().clone(),
            location: controller.redirect().map(str::to_string),
        })
    }
    .await;
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::debug!(kind = %kind, error = %e, "admin dispatch failed");
            e.into_response()
        }
    }
}

async fn admin_kind(
    State(app): State<App>,
    Path(kind): Path<String>,
    method: axum::http::Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> Response {
    dispatch_admin(app, kind, (None, None), method, headers, params, body.map(|Json(v)| v)).await
}

async fn admin_second(
    State(app): State<App>,
    Path((kind, second)): Path<(String, String)>,
    method: axum::http::Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> Response {
    dispatch_admin(
        app,
        kind,
        (Some(second), None),
        method,
        headers,
        params,
        body.map(|Json(v)| v),
    )
    .await
}

async fn admin_third(
    State(app): State<App>,
    Path((kind, second, third)): Path<(String, String, String)>,
    method: axum::http::Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> Response {
    dispatch_admin(
        app,
        kind,
        (Some(second), Some(third)),
        method,
        headers,
        params,
        body.map(|Json(v)| v),
    )
    .await
}
