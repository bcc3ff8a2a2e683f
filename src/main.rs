use billing_notifier::{config::AppConfig, host::FunctionHost};
use tokio::io::AsyncReadExt;
use tracing::{info, debug};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("billing_notifier=debug".parse()?)
            .add_directive("aws_sdk=warn".parse()?))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting billing notifier");
    let config = AppConfig::from_env()?;
    let host = FunctionHost::new(&config).await?;

    if let Some(path) = std::env::args().nth(1) {
        debug!("Reading event from {}", path);
        let raw = tokio::fs::read_to_string(&path).await?;
        host.run_once(&raw).await?;
        return Ok(());
    }

    if host.has_queue() {
        return host.run_queue().await;
    }

    debug!("Reading event from stdin");
    let mut raw = String::new();
    tokio::io::stdin().read_to_string(&mut raw).await?;
    host.run_once(&raw).await?;
    Ok(())
}
