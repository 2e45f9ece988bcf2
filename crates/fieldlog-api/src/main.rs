use fieldlog_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Console logging before anything else so setup failures are visible
    fieldlog_api::telemetry::init_tracing();

    // Initialize the application (storage, ledger, routes)
    let (_state, router) = fieldlog_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    fieldlog_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
