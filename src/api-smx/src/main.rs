use std::sync::Arc;

use anyhow::Context;
use core_smx::{TraversalOptions, Traverser, get_api_base_url, setup_logging};

use api_smx::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    setup_logging("api_smx=debug,core_smx=info,tower_http=debug");

    let options = TraversalOptions::from_env();
    tracing::info!(
        "Traversal options: concurrency {}, request timeout {:?}, run budget {:?}",
        options.concurrency,
        options.request_timeout,
        options.run_budget
    );
    let traverser = Traverser::http(options).context("Cannot set up the HTTP client")?;
    let app = routes::router().with_state(Arc::new(traverser));

    let addr = get_api_base_url().context("Invalid HOST or PORT")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
