// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::Context;
use axum::http::{HeaderName, HeaderValue, Method};
use server::{config::ServerConfig, database, routes};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");
    let config = ServerConfig::from_env();

    let db_pool = match database::establish_connection_pool(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("Database connection was made successfully.");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect with the database: {:?}", e);
            std::process::exit(1);
        }
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ]);
    let cors = match config
        .frontend_url
        .as_deref()
        .and_then(|url| HeaderValue::from_str(url).ok())
    {
        Some(origin) => {
            tracing::info!("CORS restricted to {:?}", origin);
            cors.allow_origin(origin)
        }
        None => cors.allow_origin(Any),
    };

    let app = routes::create_router(db_pool)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    tracing::info!("The server listens on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
