use access_token_service::config::json_logs_from_env;
use access_token_service::{Config, CoreServices};
use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(json_output: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(json_logs_from_env());

    info!("Starting Access Token Service");

    let config = Config::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    let core = CoreServices::init(&config).map_err(|e| {
        error!(error = %e, "Key store could not be loaded");
        e
    })?;
    let document = core
        .identity_document(None, None)
        .context("building identity document")?;

    info!(
        active_signing_alias = core.registry().active_signing_alias(),
        "Access Token Service ready"
    );
    println!("{}", serde_json::to_string_pretty(&document)?);

    Ok(())
}
