use std::net::TcpListener;

use sessionkeeper::configuration::get_configuration;
use sessionkeeper::startup::{build_auth_service, run};
use sessionkeeper::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );

    let auth = build_auth_service(configuration).await.map_err(|e| {
        tracing::error!("Failed to initialise credential store: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Database connection error")
    })?;

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, auth)?.await
}
