//! # 19sixtyfive Site Runtime
//!
//! ## Startup Sequence
//!
//! 1. Initialize structured logging from the telemetry environment
//! 2. Resolve and validate configuration (missing secrets are fatal here)
//! 3. Build the gateway and serve until Ctrl+C

use anyhow::{Context, Result};
use tracing::info;

use site_gateway::{EnvResolver, GatewayConfig, SiteGatewayService};
use site_telemetry::{init_logging, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("failed to initialize logging")?;

    let env = EnvResolver::from_process();
    let config = GatewayConfig::from_env(&env).context("invalid configuration")?;
    info!(
        service = %telemetry.service_name,
        environment = config.environment.as_str(),
        addr = %config.http_addr(),
        "Configuration loaded"
    );

    let mut service = SiteGatewayService::new(config).context("failed to build gateway")?;
    service
        .start(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received, shutting down");
            }
        })
        .await
        .context("gateway stopped with an error")?;

    Ok(())
}
