use std::io::Write;
use std::sync::Arc;

use chrono::Local;
use kiosk_player::config;
use kiosk_player::headless::HeadlessSurface;
use kiosk_player::{AppError, EngineChannel, LogStatusSink, SurfaceSlot};
use log::{error, info};

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    info!("Starting kiosk_player (headless surfaces)...");

    let path = config::config_path();
    let app_config = config::load_config(&path).map_err(|e| {
        error!("Cannot start without configuration: {}", e);
        e
    })?;

    let channel = EngineChannel::new();
    let front = HeadlessSurface::new(channel.events().reporter(SurfaceSlot::Front), app_config.headless_clip_duration);
    let back = HeadlessSurface::new(channel.events().reporter(SurfaceSlot::Back), app_config.headless_clip_duration);

    kiosk_player::start(app_config, Box::new(front), Box::new(back), Arc::new(LogStatusSink), channel).await
}
