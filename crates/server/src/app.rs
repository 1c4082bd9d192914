use crate::config::Cors;
use crate::state::AppState;
use crate::web::middleware as mw;
use crate::web::{self, routes_vcloud};
use crate::{model, vcloud};
use axum::serve::Serve;
use axum::{Router, middleware};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa_swagger_ui::SwaggerUi;
use vcloud_common::error::Result;

/// Represents the core web application.
///
pub struct App {
    server: Serve<TcpListener, Router, Router>,
}

impl App {
    /// Builds the application, but does not run it.
    ///
    /// This configures the entire Axum router, including routes, state, and
    /// middleware. Binds a `TcpListener` to the provided address and
    /// determines the final URL of the application.
    ///
    /// # Arguments
    ///
    /// * `app_state` - Shared state for the application.
    /// * `address` - Socket address to bind to. If the port is 0, a random
    ///   available port will be used.
    /// * `cors` - Cross-origin settings.
    ///
    pub async fn build(app_state: AppState, address: SocketAddr, cors: &Cors) -> Result<Self> {
        let listener = TcpListener::bind(&address).await?;
        let router = Router::new()
            .merge(routes_vcloud::routes(app_state.clone()))
            .merge(SwaggerUi::new("/openapi").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .with_state(app_state)
            .layer(middleware::map_response(mw::log_mapper))
            .layer(mw::allow_cors(cors));

        Ok(Self {
            server: axum::serve(listener, router),
        })
    }

    /// Runs the application server.
    ///
    /// This method consumes the `App` instance and starts the server, which
    /// will run until it is shut down or an error occurs.
    ///
    pub async fn run(self) -> Result<()> {
        self.server.await.map_err(Into::into)
    }

    /// Returns the public URL of the application.
    ///
    pub fn get_url(&self) -> Result<String> {
        Ok(format!("http://{}", self.server.local_addr()?))
    }
}

/// API documentation for the application.
///
/// Defines the OpenAPI specification for the entire application, including
/// all paths, components (schemas), and security schemes.
///
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        routes_vcloud::find_all_by_name,
        routes_vcloud::node_status,
        routes_vcloud::node_version,
        routes_vcloud::last_version,
        routes_vcloud::subscription_vm,
        routes_vcloud::subscription_status,
        routes_vcloud::console,
        routes_vcloud::link,
        routes_vcloud::execute,
        routes_vcloud::clear_cache,
    ),
    components(schemas(
        model::types::VmExecution,
        model::types::SubscriptionStatus,
        vcloud::types::VmRecord,
        vcloud::types::VmStatus,
        vcloud::types::VmOperation,
        web::types::ExecutionPayload,
        web::types::VersionPayload,
        web::types::ClearedPayload,
    )),
    modifiers(&JwtSecurity)
)]
struct ApiDoc;

/// Modifier to add JWT Bearer authentication scheme to the OpenAPI documentation.
///
struct JwtSecurity;
impl utoipa::Modify for JwtSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}
