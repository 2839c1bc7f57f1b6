mod config;
mod routes;

use crate::config::{HostConfig, HostError};

#[tokio::main]
async fn main() -> Result<(), HostError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(HostError::Env(e.to_string()));
        }
    }
    tracing_subscriber::fmt::init();

    let config = HostConfig::from_env()?;
    let conf = leptos::prelude::get_configuration(None).map_err(|e| HostError::Leptos(e.to_string()))?;
    let app = routes::leptos_app(conf.leptos_options);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(port = config.port, "nfhub listening");
    axum::serve(listener, app).await?;
    Ok(())
}
