use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use micam::config::{self, AppConfig, Codec, StreamConfig};
use micam::Bridge;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "micam-bridge",
    version,
    about = "Republish camera WebSocket video feeds as RTSP streams"
)]
struct Args {
    /// YAML file listing cameras; flags below are used when it is absent
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Camera server base URL
    #[arg(long, env = "MILOCO_BASE_URL", default_value_t = config::default_base_url())]
    base_url: String,

    #[arg(long, env = "MILOCO_USERNAME", default_value_t = config::default_username())]
    username: String,

    /// Login password (as expected by the camera server)
    #[arg(long, env = "MILOCO_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    #[arg(long, env = "CAMERA_ID", default_value = "")]
    camera_id: String,

    #[arg(long, env = "STREAM_CHANNEL", default_value_t = config::default_channel())]
    channel: String,

    /// h264, hevc, or any ffmpeg input format name
    #[arg(long, env = "VIDEO_CODEC", default_value = "hevc")]
    video_codec: String,

    /// RTSP URL to publish to
    #[arg(long, env = "RTSP_URL", default_value_t = config::default_rtsp_url())]
    rtsp_url: String,

    /// Publish through an ffmpeg subprocess instead of the built-in client
    #[arg(long, env = "USE_FFMPEG")]
    use_ffmpeg: bool,
}

impl Args {
    fn single_camera(&self) -> AppConfig {
        AppConfig {
            cameras: vec![StreamConfig {
                base_url: self.base_url.clone(),
                username: self.username.clone(),
                password: self.password.clone(),
                camera_id: self.camera_id.clone(),
                channel: self.channel.clone(),
                video_codec: Codec::from(self.video_codec.as_str()),
                rtsp_url: self.rtsp_url.clone(),
                use_ffmpeg: self.use_ffmpeg,
            }],
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // `.env` values fill in variables that are not already set, including RUST_LOG.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env file"),
    }

    let args = Args::parse();

    let app = match AppConfig::from_file(&args.config) {
        Ok(Some(app)) => app,
        Ok(None) => {
            tracing::info!("no config file, using flags and environment");
            args.single_camera()
        }
        Err(e) => {
            tracing::error!(path = %args.config.display(), error = %e, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    let cameras = match app.into_valid_cameras() {
        Ok(cameras) => cameras,
        Err(e) => {
            tracing::error!(error = %e, "nothing to run");
            return ExitCode::FAILURE;
        }
    };

    let mut bridges = Vec::with_capacity(cameras.len());
    for camera in cameras {
        let camera_id = camera.camera_id.clone();
        match Bridge::new(camera) {
            Ok(bridge) => bridges.push(Arc::new(bridge)),
            Err(e) => tracing::warn!(camera_id, error = %e, "failed to create bridge"),
        }
    }
    if bridges.is_empty() {
        tracing::error!("no bridges could be created");
        return ExitCode::FAILURE;
    }

    for bridge in &bridges {
        let span = tracing::info_span!("bridge", camera_id = %bridge.camera_id());
        let bridge = Arc::clone(bridge);
        tokio::spawn(async move { bridge.run().await }.instrument(span));
    }
    tracing::info!(count = bridges.len(), "bridges started");

    shutdown_signal().await;
    tracing::info!("shutting down");

    for bridge in &bridges {
        bridge.close().await;
    }
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
