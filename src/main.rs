use agudie::{AgudieApp, AgudieError, PlayerConfig};
use anyhow::{anyhow, Context, Result};
use eframe::NativeOptions;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!(
        "Starting Agudie Media Player v{} on {}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    ffmpeg_next::init()
        .map_err(AgudieError::from)
        .context("Failed to initialize FFmpeg")?;
    ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);

    let config = PlayerConfig::load();
    let app_name = config.title.clone();

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.title.clone())
            .with_position(config.window_position)
            .with_inner_size(config.window_size)
            .with_min_inner_size(config.min_window_size)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        &app_name,
        options,
        Box::new(|cc| Ok(Box::new(AgudieApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("Window error: {}", e))
}
