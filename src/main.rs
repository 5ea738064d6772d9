use sunspec_bridge::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::new();

    let config = ConfigWrapper::new(options.config_file.clone()).unwrap_or_else(|err| {
        eprintln!("Failed to load config: {:?}", err);
        std::process::exit(255);
    });
    sunspec_bridge::init_logging(&config.loglevel());

    if options.once {
        return sunspec_bridge::read_once(config).await;
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        if let Err(e) = shutdown_tx.send(()) {
            error!("Failed to send shutdown signal: {}", e);
        }
    });

    sunspec_bridge::app(shutdown_rx, config).await
}
