// src/main.rs
mod api;
mod config;
mod geometry;
mod model;
mod planner;
mod types;

use config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Konnte .env nicht laden: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let shipment_defaults = app_config.shipment.clone();

    println!("🚀 Load planning service startet...");
    api::start_api_server(api_config, shipment_defaults).await;
}
