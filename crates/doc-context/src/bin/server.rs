//! doc-context server binary
//!
//! Run with: cargo run -p doc-context --bin doc-context-server

use doc_context::{config::DocContextConfig, server::DocContextServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_context=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                        doc-context                        ║
║        Documents, spreadsheets and images to context      ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = DocContextConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Vision model: {}", config.vision.model);
    tracing::info!("  - Chat model: {}", config.chat.model);
    tracing::info!("  - Parallel files: {}", config.processing.parallel_files());
    tracing::info!("  - File timeout: {}s", config.processing.file_timeout_secs);

    if config.vision.api_key().is_none() {
        tracing::warn!(
            "{} is not set; image OCR requests will be unauthenticated",
            config.vision.api_key_env
        );
    }

    let server = DocContextServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/ingest     - Upload documents");
    println!("  POST /api/summarize  - Summarize a context");
    println!("  POST /api/ask        - Ask about a context");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
