use std::path::PathBuf;

use maproute::{MapRouteConfig, MapRouteError, RouteResolver, VERSION, telemetry, web};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match MapRouteConfig::load_from_path(config_path) {
        Ok(config) => config,
        Err(e) => {
            let message = e
                .downcast_ref::<MapRouteError>()
                .map_or_else(|| format!("{e:#}"), MapRouteError::user_message);
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    let _telemetry = telemetry::init(&config.logging)?;
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing::info!("Starting MapRoute AI Agent v{}", VERSION);
    tracing::info!(
        "Request timeout {:.1}s, geocoding {} attempts, routing {} attempts",
        config.agent.request_timeout().as_secs_f64(),
        config.geocoding.max_attempts,
        config.routing.max_attempts
    );

    let resolver = RouteResolver::from_config(&config)?;
    web::run(&config, resolver).await?;

    tracing::info!("Shutting down MapRoute AI Agent");
    Ok(())
}
