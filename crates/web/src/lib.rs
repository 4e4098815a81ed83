pub use crate::common::RouteResult;

use axum::{extract::FromRef, Router};
use config::ServerConfig;
use sessions::Sessions;
use tokio::net::TcpListener;

pub mod api;
pub mod common;
pub mod config;
pub mod demo;
pub mod hateoas;
pub mod middleware;
pub mod sessions;

#[derive(Clone, FromRef)]
pub struct WebState {
    pub sessions: Sessions,
}

pub async fn start_web_server(config: &ServerConfig, state: WebState) -> std::io::Result<()> {
    let routes = Router::new().nest_service("/api", api::routes(state));

    let listener = TcpListener::bind(config.bind).await?;
    log::info!("listening on {}", config.bind);
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}
