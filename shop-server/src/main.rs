use shop_server::core::BoxError;
use shop_server::{Config, Server, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    init_logger_with_file(None, config.log_json, config.log_dir.as_deref());
    print_banner();

    tracing::info!("Starting shop-server (env: {})", config.environment);

    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {e}");
        return Err(e);
    }
    Ok(())
}
