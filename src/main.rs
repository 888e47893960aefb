use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put, MethodRouter},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;

use crate::auth::AuthConfig;
use crate::config::Config;
use crate::db::{PgStore, ProductStore, UserStore};
use crate::handlers::{products, users};

/// Shared application state. Stores are injected as trait objects so the
/// handlers never reach for a global connection.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,inventario_api=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Database connection pool established.");

    info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations complete.");

    let store = Arc::new(PgStore::new(pool));
    let state = AppState {
        products: store.clone(),
        users: store,
    };

    if !config.protect_user_routes {
        info!("User routes are public (set PROTECT_USER_ROUTES=true to require a token)");
    }

    let app = build_router(
        state,
        AuthConfig::new(&config.jwt_secret),
        config.protect_user_routes,
    );

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, draining connections..."),
        _ = terminate => info!("Received SIGTERM, draining connections..."),
    }
}

fn build_router(state: AppState, auth_config: AuthConfig, protect_user_routes: bool) -> Router {
    let gate = middleware::from_fn_with_state(auth_config, auth::require_bearer);
    let protected = |route: MethodRouter<AppState>| route.route_layer(gate.clone());
    let user_mutation = |route: MethodRouter<AppState>| {
        if protect_user_routes {
            protected(route)
        } else {
            route
        }
    };

    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/health", get(handlers::health))

        // ── Products ────────────────────────────────────────────────────────
        .route(
            "/api/productos",
            get(products::list_products).merge(protected(post(products::create_product))),
        )
        .route(
            "/api/productos/:id",
            get(products::get_product).merge(protected(
                put(products::update_product).delete(products::delete_product),
            )),
        )
        .route(
            "/api/productos/:id/inventario",
            protected(patch(products::adjust_inventory)),
        )

        // ── Users ───────────────────────────────────────────────────────────
        .route(
            "/api/usuarios",
            get(users::list_users).merge(user_mutation(post(users::create_user))),
        )
        .route(
            "/api/usuarios/:id",
            get(users::get_user).merge(user_mutation(
                put(users::update_user).delete(users::delete_user),
            )),
        )

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
