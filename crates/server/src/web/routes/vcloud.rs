//! Protected vCloud routes

use crate::model::types::{VcloudParameters, VmExecution};
use crate::services::{self, execution, inventory};
use crate::state::AppState;
use crate::web::auth::Claims;
use crate::web::middleware as mw;
use crate::web::types::*;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Extension, Json};
use axum::{Router, middleware};
use vcloud_common::prelude::{Error, Result};

pub fn routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/vcloud/nodes/{node}/vms/{criteria}", get(find_all_by_name))
        .route("/vcloud/nodes/{node}/status", get(node_status))
        .route("/vcloud/nodes/{node}/version", get(node_version))
        .route("/vcloud/version", get(last_version))
        .route("/vcloud/subscriptions/{id}/vm", get(subscription_vm))
        .route("/vcloud/subscriptions/{id}/status", get(subscription_status))
        .route("/vcloud/subscriptions/{id}/console.png", get(console))
        .route("/vcloud/subscriptions/{id}/link", post(link))
        .route("/vcloud/subscriptions/{id}/executions", post(execute))
        .route("/vcloud/cache", delete(clear_cache))
        .route_layer(middleware::from_fn_with_state(app_state, mw::require_auth))
}

/// Loads the parameters of a node visible to the caller.
///
async fn visible_node(app_state: &AppState, node: &str, login: &str) -> Result<VcloudParameters> {
    if !app_state.store.is_node_visible(node, login).await? {
        return Err(Error::NotFound(format!("Node '{node}'")));
    }
    services::node_parameters(&app_state.store, node).await
}

/// Fails with `NotFound` unless the node of the subscription is visible to the
/// caller.
///
async fn check_subscription(app_state: &AppState, subscription: i32, login: &str) -> Result<()> {
    if !app_state
        .store
        .is_subscription_visible(subscription, login)
        .await?
    {
        return Err(Error::NotFound(format!("Subscription '{subscription}'")));
    }
    Ok(())
}

/// Loads the parameters of a subscription whose node is visible to the caller.
///
async fn visible_subscription(
    app_state: &AppState,
    subscription: i32,
    login: &str,
) -> Result<VcloudParameters> {
    check_subscription(app_state, subscription, login).await?;
    services::subscription_parameters(&app_state.store, subscription).await
}

// -----------------------------------------------------------------------------

/// Searches the VMs of a node by a part of their name.
///
/// # Returns
///
/// At most ten VMs sorted by name, an empty list when the caller cannot see
/// the node.
///
#[utoipa::path(
    get,
    path = "/vcloud/nodes/{node}/vms/{criteria}",
    tags = ["Node"],
    security(("bearer_auth" = [])),
    params(
        ("node", Path, description = "Node identifier"),
        ("criteria", Path, description = "Part of the VM name")
    ),
    responses(
        (status = 200, body = VmsResponse, description = "Matching VMs"),
        (status = 400, body = String, description = "Invalid node parameters"),
        (status = 401, body = String, description = "Unauthorized"),
        (status = 500, body = String, description = "Internal server error")
    )
)]
#[tracing::instrument(level = "trace", target = "handler",
	skip(app_state, claims),
	fields(login = %claims.sub))]
async fn find_all_by_name(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((node, criteria)): Path<(String, String)>,
) -> Result<Json<VmsResponse>> {
    let vms = inventory::find_all_by_name(
        &app_state.store,
        &app_state.vcloud,
        &node,
        &criteria,
        &claims.sub,
    )
    .await?;
    tracing::info!(target: "handler", count = vms.len(), "Found VMs");

    Ok(Json(Response::new(vms)))
}

/// Checks the node credentials grant admin access to vCloud.
///
#[utoipa::path(
    get,
    path = "/vcloud/nodes/{node}/status",
    tags = ["Node"],
    security(("bearer_auth" = [])),
    params(("node", Path, description = "Node identifier")),
    responses(
        (status = 200, body = Response<bool>, description = "Admin access granted"),
        (status = 400, body = String, description = "Login failed or not admin"),
        (status = 401, body = String, description = "Unauthorized"),
        (status = 404, body = String, description = "Node not found"),
        (status = 500, body = String, description = "Internal server error")
    )
)]
#[tracing::instrument(level = "trace", target = "handler",
	skip(app_state, claims),
	fields(login = %claims.sub))]
async fn node_status(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(node): Path<String>,
) -> Result<Json<Response<bool>>> {
    let parameters = visible_node(&app_state, &node, &claims.sub).await?;
    let status = inventory::check_status(&app_state.vcloud, &parameters).await?;

    Ok(Json(Response::new(status)))
}

/// Returns the vCloud version of a node.
///
#[utoipa::path(
    get,
    path = "/vcloud/nodes/{node}/version",
    tags = ["Node"],
    security(("bearer_auth" = [])),
    params(("node", Path, description = "Node identifier")),
    responses(
        (status = 200, body = Response<VersionPayload>, description = "Version, absent when unknown"),
        (status = 400, body = String, description = "Login failed"),
        (status = 401, body = String, description = "Unauthorized"),
        (status = 404, body = String, description = "Node not found"),
        (status = 500, body = String, description = "Internal server error")
    )
)]
#[tracing::instrument(level = "trace", target = "handler",
	skip(app_state, claims),
	fields(login = %claims.sub))]
async fn node_version(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(node): Path<String>,
) -> Result<Json<Response<VersionPayload>>> {
    let parameters = visible_node(&app_state, &node, &claims.sub).await?;
    let version = inventory::version(&app_state.vcloud, &parameters).await?;

    Ok(Json(Response::new(version.into())))
}

/// Returns the latest vCloud suite version published by VMware.
///
#[utoipa::path(
    get,
    path = "/vcloud/version",
    tags = ["Node"],
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = Response<VersionPayload>, description = "Version, absent when unknown"),
        (status = 401, body = String, description = "Unauthorized"),
        (status = 500, body = String, description = "Internal server error")
    )
)]
async fn last_version(State(app_state): State<AppState>) -> Result<Json<Response<VersionPayload>>> {
    let version = inventory::last_version(&app_state.vcloud).await?;

    Ok(Json(Response::new(version.into())))
}

/// Returns the current record of the VM of a subscription.
///
#[utoipa::path(
    get,
    path = "/vcloud/subscriptions/{id}/vm",
    tags = ["Subscription"],
    security(("bearer_auth" = [])),
    params(("id", Path, description = "Subscription identifier")),
    responses(
        (status = 200, body = VmResponse, description = "VM found"),
        (status = 400, body = String, description = "Login failed or unknown VM"),
        (status = 401, body = String, description = "Unauthorized"),
        (status = 404, body = String, description = "Subscription not found"),
        (status = 500, body = String, description = "Internal server error")
    )
)]
#[tracing::instrument(level = "trace", target = "handler",
	skip(app_state, claims),
	fields(login = %claims.sub))]
async fn subscription_vm(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(subscription): Path<i32>,
) -> Result<Json<VmResponse>> {
    let parameters = visible_subscription(&app_state, subscription, &claims.sub).await?;
    let vm = inventory::vm_details(&app_state.vcloud, &parameters).await?;

    Ok(Json(Response::new(vm)))
}

/// Returns the VM record of a subscription along with its schedule count.
///
#[utoipa::path(
    get,
    path = "/vcloud/subscriptions/{id}/status",
    tags = ["Subscription"],
    security(("bearer_auth" = [])),
    params(("id", Path, description = "Subscription identifier")),
    responses(
        (status = 200, body = StatusResponse, description = "Subscription status"),
        (status = 400, body = String, description = "Login failed or unknown VM"),
        (status = 401, body = String, description = "Unauthorized"),
        (status = 404, body = String, description = "Subscription not found"),
        (status = 500, body = String, description = "Internal server error")
    )
)]
#[tracing::instrument(level = "trace", target = "handler",
	skip(app_state, claims),
	fields(login = %claims.sub))]
async fn subscription_status(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(subscription): Path<i32>,
) -> Result<Json<StatusResponse>> {
    check_subscription(&app_state, subscription, &claims.sub).await?;
    let status =
        inventory::check_subscription_status(&app_state.store, &app_state.vcloud, subscription)
            .await?;

    Ok(Json(Response::new(status)))
}

/// Returns the console thumbnail of the VM of a subscription.
///
/// The body is empty when vCloud has no screen to show.
///
#[utoipa::path(
    get,
    path = "/vcloud/subscriptions/{id}/console.png",
    tags = ["Subscription"],
    security(("bearer_auth" = [])),
    params(("id", Path, description = "Subscription identifier")),
    responses(
        (status = 200, content_type = "image/png", body = Vec<u8>, description = "Console thumbnail"),
        (status = 401, body = String, description = "Unauthorized"),
        (status = 404, body = String, description = "Subscription not found"),
        (status = 500, body = String, description = "Internal server error")
    )
)]
async fn console(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(subscription): Path<i32>,
) -> Result<impl IntoResponse> {
    let parameters = visible_subscription(&app_state, subscription, &claims.sub).await?;
    let screen = inventory::console(&app_state.vcloud, &parameters).await?;

    Ok(([(CONTENT_TYPE, "image/png")], screen))
}

/// Validates the VM of a subscription exists.
///
#[utoipa::path(
    post,
    path = "/vcloud/subscriptions/{id}/link",
    tags = ["Subscription"],
    security(("bearer_auth" = [])),
    params(("id", Path, description = "Subscription identifier")),
    responses(
        (status = 200, body = VmResponse, description = "Subscription linked"),
        (status = 400, body = String, description = "Login failed or unknown VM"),
        (status = 401, body = String, description = "Unauthorized"),
        (status = 404, body = String, description = "Subscription not found"),
        (status = 500, body = String, description = "Internal server error")
    )
)]
#[tracing::instrument(level = "trace", target = "handler",
	skip(app_state, claims),
	fields(login = %claims.sub))]
async fn link(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(subscription): Path<i32>,
) -> Result<Json<VmResponse>> {
    let parameters = visible_subscription(&app_state, subscription, &claims.sub).await?;
    let vm = inventory::link(&app_state.vcloud, &parameters).await?;

    Ok(Json(Response::new(vm)))
}

/// Executes an operation on the VM of a subscription.
///
/// The requested operation goes through the failsafe table first, the
/// returned execution tells which operation was actually sent to vCloud.
///
/// # Arguments
///
/// * `State(app_state)`: Shared application state.
/// * `Extension(claims)`: Claims of the caller.
/// * `Path(subscription)`: Subscription identifier.
/// * `Json(payload)`: Requested operation.
///
#[utoipa::path(
    post,
    path = "/vcloud/subscriptions/{id}/executions",
    request_body = ExecutionPayload,
    tags = ["Subscription"],
    security(("bearer_auth" = [])),
    params(("id", Path, description = "Subscription identifier")),
    responses(
        (status = 200, body = Response<VmExecution>, description = "Execution completed"),
        (status = 400, body = String, description = "Login failed or unknown VM"),
        (status = 401, body = String, description = "Unauthorized"),
        (status = 404, body = String, description = "Subscription not found"),
        (status = 409, body = String, description = "Operation rejected by vCloud"),
        (status = 500, body = String, description = "Internal server error")
    )
)]
#[tracing::instrument(level = "trace", target = "handler",
	skip(app_state, claims),
	fields(login = %claims.sub))]
async fn execute(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(subscription): Path<i32>,
    Json(payload): Json<ExecutionPayload>,
) -> Result<Json<Response<VmExecution>>> {
    check_subscription(&app_state, subscription, &claims.sub).await?;

    let mut vm_execution = VmExecution::new(subscription, payload.operation);
    execution::execute(&app_state.store, &app_state.vcloud, &mut vm_execution).await?;
    tracing::info!(target: "handler", operation = ?vm_execution.operation, "Execution completed");

    Ok(Json(Response::new(vm_execution)))
}

/// Drops every cached vCloud session.
///
#[utoipa::path(
    delete,
    path = "/vcloud/cache",
    tags = ["Node"],
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = Response<ClearedPayload>, description = "Cache cleared"),
        (status = 401, body = String, description = "Unauthorized")
    )
)]
async fn clear_cache(State(app_state): State<AppState>) -> Json<Response<ClearedPayload>> {
    let cleared = inventory::clear_cache(&app_state.vcloud);

    Json(Response::new(ClearedPayload { cleared }))
}
