//! Study Catalog Gateway
//!
//! Browse, search and administer a Department > Semester > Subject > Resource catalog held
//! by a remote backend.

mod api;
mod auth;
mod catalog;
mod client;
mod config;
mod errors;
mod models;
mod remote;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::Uri,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use client::CatalogClient;
use config::Config;
use errors::{AppError, AppErrorWithRevision};
use remote::{CatalogBackend, HttpBackend, InMemoryBackend, RemoteHandle};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<CatalogClient>,
    /// Key the trusted front end presents on every `/api` request; unset disables the check
    pub api_psk: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Study Catalog Gateway");
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (CATALOG_API_PSK). Any client can assert a caller principal!");
    }

    let backend = build_backend(&config)?;
    let handle = RemoteHandle::initializing();
    tokio::spawn(connect(backend, handle.clone(), config.connect_retry));

    let state = AppState {
        client: Arc::new(CatalogClient::new(handle)),
        api_psk: config.api_psk.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Remote backend selected by configuration: HTTP when a URL is set, otherwise in-memory.
fn build_backend(config: &Config) -> Result<Arc<dyn CatalogBackend>, Box<dyn std::error::Error>> {
    if let Some(url) = &config.remote_url {
        tracing::info!("Remote backend: {}", url);
        return Ok(Arc::new(HttpBackend::new(url, config.remote_timeout)?));
    }

    if config.admin_principals.is_empty() {
        tracing::warn!("No admin principals configured (CATALOG_ADMIN_PRINCIPALS). Admin routes will deny everyone!");
    }
    let mut backend = InMemoryBackend::with_admins(config.admin_principals.clone());
    if let Some(path) = &config.seed_path {
        let departments = config::load_seed(path)?;
        tracing::info!("Seeded {} departments from {:?}", departments.len(), path);
        backend = backend.with_departments(departments);
    }
    tracing::info!("Using in-memory backend");
    Ok(Arc::new(backend))
}

/// Probe the backend until it answers, then make it available to request handlers.
async fn connect(backend: Arc<dyn CatalogBackend>, handle: RemoteHandle, retry: Duration) {
    loop {
        match backend.ready().await {
            Ok(()) => {
                handle.install(backend);
                tracing::info!("Remote backend ready");
                return;
            }
            Err(e) => {
                tracing::warn!("Remote backend not ready, retrying in {:?}: {}", retry, e);
                tokio::time::sleep(retry).await;
            }
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Admin management routes, behind the authorization gate. The gate's admin check
    // runs before request bodies are validated.
    let admin_routes = Router::new()
        .route("/admin/resources", get(api::list_managed_resources))
        .route("/admin/departments", post(api::create_department))
        .route(
            "/admin/departments/{department_id}",
            put(api::rename_department).delete(api::delete_department),
        )
        .route(
            "/admin/departments/{department_id}/semesters",
            post(api::create_semester),
        )
        .route(
            "/admin/departments/{department_id}/semesters/{semester_id}",
            put(api::rename_semester).delete(api::delete_semester),
        )
        .route(
            "/admin/departments/{department_id}/semesters/{semester_id}/subjects",
            post(api::create_subject),
        )
        .route(
            "/admin/departments/{department_id}/semesters/{semester_id}/subjects/{subject_id}",
            put(api::rename_subject).delete(api::delete_subject),
        )
        .route(
            "/admin/departments/{department_id}/semesters/{semester_id}/subjects/{subject_id}/resources",
            post(api::create_resource),
        )
        .route(
            "/admin/departments/{department_id}/semesters/{semester_id}/subjects/{subject_id}/resources/{resource_id}",
            put(api::update_resource).delete(api::delete_resource),
        )
        .route("/admin/roles", post(api::assign_role))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::admin_guard_layer,
        ));

    // API routes
    let api_routes = Router::new()
        // Browse
        .route("/departments", get(api::list_departments))
        .route("/departments/{department_id}", get(api::get_department))
        .route(
            "/departments/{department_id}/semesters/{semester_id}",
            get(api::get_semester),
        )
        .route(
            "/departments/{department_id}/semesters/{semester_id}/subjects/{subject_id}",
            get(api::get_subject),
        )
        // Search
        .route("/search", get(api::search_resources))
        // Account
        .route("/me", get(api::get_me))
        .route("/me/role", get(api::get_my_role))
        .route(
            "/me/profile",
            get(api::get_my_profile).put(api::save_my_profile),
        )
        .route("/users/{principal}/profile", get(api::get_user_profile))
        // Admin
        .route("/admin/status", get(api::admin_status))
        .merge(admin_routes)
        // Apply PSK auth middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::psk_auth_layer,
        ));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Unknown routes get the error envelope.
async fn not_found(State(state): State<AppState>, uri: Uri) -> AppErrorWithRevision {
    AppErrorWithRevision {
        error: AppError::NotFound(format!("No route for {}", uri.path())),
        revision_id: state.client.revision().await,
    }
}
