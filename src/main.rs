use image_to_matrix::{config::Settings, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter().into()),
        )
        .init();

    info!(
        "starting image-to-matrix on {}:{} (debug={})",
        settings.host, settings.port, settings.debug
    );
    server::serve(settings).await?;
    Ok(())
}
