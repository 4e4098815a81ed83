use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracking::{
    quota::{FileBackend, KeyValueQuotaStore, LocalCalendar},
    TrackingSettings,
};
use web::{config::ServerConfig, demo, sessions::Sessions, start_web_server, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    // http request traces
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    if let Err(why) = tracing::subscriber::set_global_default(subscriber) {
        log::warn!("request tracing disabled: {}", why);
    }

    // configuration
    let config = ServerConfig::from_env().expect("expected a valid TRACKING_BIND address.");
    let settings = TrackingSettings::from_env();

    // quota storage
    let backend = FileBackend::open(&config.quota_file).expect("could not open quota file.");
    let quota = Arc::new(KeyValueQuotaStore::new(backend, LocalCalendar));

    // subjects
    let catalog = demo::catalog().expect("demo routes are invalid.");

    // web server
    let web_future = start_web_server(
        &config,
        WebState {
            sessions: Sessions::new(catalog, quota, settings),
        },
    );

    if let Err(why) = web_future.await {
        log::error!("web server stopped: {}", why);
    }
}
