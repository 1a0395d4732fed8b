use anyhow::{Context, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    skytray_core::init()?;

    let config = skytray_core::AppConfig::load().context("Failed to load configuration")?;
    tracing::info!("Config directory: {}", config.config_dir.display());

    let app = skytray_core::App::new(&config)?;
    app.start().await;

    let settings = app.current_settings();
    tracing::info!(
        "Polling {:?} every {}s",
        settings.location,
        settings.poll_interval_seconds
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    // Graceful shutdown
    app.shutdown();

    let weather = app.weather_state();
    if let Some(label) = weather.temperature_label() {
        tracing::info!("Last reading: {} ({})", label, weather.condition().description());
    }
    tracing::info!("{} failed calls in history", app.error_history().len());

    Ok(())
}
