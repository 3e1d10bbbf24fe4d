use screening_console::{api::start_server, pipeline::PipelineClient};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let pipeline_url = std::env::var("PIPELINE_API_URL")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("Screening Results Console - API Server");
    info!("Pipeline API: {}", pipeline_url);
    info!("Port: {}", api_port);

    let client = Arc::new(PipelineClient::new(pipeline_url)?);

    info!("Starting API server...");

    start_server(client, api_port).await?;

    Ok(())
}
