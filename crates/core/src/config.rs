//! Camera configuration model.
//!
//! A config file lists one or more cameras:
//!
//! ```yaml
//! cameras:
//!   - base_url: https://miloco:8000
//!     username: admin
//!     password: 5f4dcc3b5aa765d61d8327deb882cf99
//!     camera_id: "1234567"
//!     channel: "0"
//!     video_codec: hevc
//!     rtsp_url: rtsp://127.0.0.1:8554/front
//!     use_ffmpeg: false
//! ```
//!
//! When no file is present the CLI builds a single [`StreamConfig`] from
//! flags and environment variables instead.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{BridgeError, Result};

/// Video codec carried by the camera feed.
///
/// Unknown names are preserved in [`Codec::Other`]: keyframe detection
/// fails open for them and the subprocess publisher passes the name to
/// ffmpeg's `-f` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Codec {
    H264,
    Hevc,
    Other(String),
}

impl Codec {
    /// Name as understood by ffmpeg's `-f` and the config file.
    pub fn as_str(&self) -> &str {
        match self {
            Self::H264 => "h264",
            Self::Hevc => "hevc",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for Codec {
    fn from(name: &str) -> Self {
        match name {
            "h264" => Self::H264,
            "hevc" => Self::Hevc,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Codec {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::Hevc
    }
}

/// Per-camera bridge settings. Created once at startup, never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Camera server base URL; its scheme picks `ws` or `wss`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub camera_id: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default)]
    pub video_codec: Codec,
    /// Target RTSP URL the stream is published to.
    #[serde(default = "default_rtsp_url")]
    pub rtsp_url: String,
    /// Remux through an ffmpeg subprocess instead of the native RTSP client.
    #[serde(default)]
    pub use_ffmpeg: bool,
}

pub fn default_base_url() -> String {
    "https://miloco:8000".to_string()
}

pub fn default_username() -> String {
    "admin".to_string()
}

pub fn default_channel() -> String {
    "0".to_string()
}

pub fn default_rtsp_url() -> String {
    "rtsp://0.0.0.0:8554/live".to_string()
}

impl StreamConfig {
    /// Reject entries the bridge cannot log in with.
    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(BridgeError::Config(format!(
                "password is required for camera {}",
                self.camera_id
            )));
        }
        if self.camera_id.is_empty() {
            return Err(BridgeError::Config("camera id is required".into()));
        }
        Ok(())
    }
}

/// Top-level config file contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cameras: Vec<StreamConfig>,
}

impl AppConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load cameras from `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist or lists no
    /// cameras, so the caller can fall back to flags and environment.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        if config.cameras.is_empty() {
            tracing::debug!(path = %path.display(), "config file lists no cameras");
            return Ok(None);
        }
        tracing::info!(
            path = %path.display(),
            cameras = config.cameras.len(),
            "loaded cameras from config file"
        );
        Ok(Some(config))
    }

    /// Keep only valid cameras, logging each one that is skipped.
    ///
    /// Fails with [`BridgeError::Startup`] when nothing usable remains.
    pub fn into_valid_cameras(self) -> Result<Vec<StreamConfig>> {
        let cameras: Vec<StreamConfig> = self
            .cameras
            .into_iter()
            .filter(|camera| match camera.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping camera");
                    false
                }
            })
            .collect();

        if cameras.is_empty() {
            return Err(BridgeError::Startup("no valid cameras configured".into()));
        }
        Ok(cameras)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(id: &str, password: &str) -> StreamConfig {
        StreamConfig {
            base_url: default_base_url(),
            username: default_username(),
            password: password.to_string(),
            camera_id: id.to_string(),
            channel: default_channel(),
            video_codec: Codec::H264,
            rtsp_url: default_rtsp_url(),
            use_ffmpeg: false,
        }
    }

    #[test]
    fn parse_full_entry() {
        let yaml = "\
cameras:
  - base_url: http://10.0.0.2:8000
    username: viewer
    password: secret
    camera_id: \"42\"
    channel: \"1\"
    video_codec: h264
    rtsp_url: rtsp://127.0.0.1:8554/cam
    use_ffmpeg: true
";
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.cameras.len(), 1);
        let cam = &config.cameras[0];
        assert_eq!(cam.base_url, "http://10.0.0.2:8000");
        assert_eq!(cam.username, "viewer");
        assert_eq!(cam.camera_id, "42");
        assert_eq!(cam.channel, "1");
        assert_eq!(cam.video_codec, Codec::H264);
        assert_eq!(cam.rtsp_url, "rtsp://127.0.0.1:8554/cam");
        assert!(cam.use_ffmpeg);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = AppConfig::from_yaml("cameras:\n  - camera_id: \"7\"\n").unwrap();
        let cam = &config.cameras[0];
        assert_eq!(cam.base_url, "https://miloco:8000");
        assert_eq!(cam.username, "admin");
        assert_eq!(cam.channel, "0");
        assert_eq!(cam.video_codec, Codec::Hevc);
        assert_eq!(cam.rtsp_url, "rtsp://0.0.0.0:8554/live");
        assert!(!cam.use_ffmpeg);
    }

    #[test]
    fn unknown_codec_preserved() {
        let config =
            AppConfig::from_yaml("cameras:\n  - camera_id: \"7\"\n    video_codec: mjpeg\n")
                .unwrap();
        assert_eq!(
            config.cameras[0].video_codec,
            Codec::Other("mjpeg".to_string())
        );
        assert_eq!(config.cameras[0].video_codec.as_str(), "mjpeg");
    }

    #[test]
    fn validate_requires_password_and_id() {
        assert!(camera("1", "pw").validate().is_ok());
        assert!(matches!(
            camera("1", "").validate(),
            Err(BridgeError::Config(_))
        ));
        assert!(matches!(
            camera("", "pw").validate(),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn invalid_cameras_skipped() {
        let config = AppConfig {
            cameras: vec![camera("1", ""), camera("2", "pw"), camera("", "pw")],
        };
        let valid = config.into_valid_cameras().unwrap();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].camera_id, "2");
    }

    #[test]
    fn no_valid_cameras_is_startup_error() {
        let config = AppConfig {
            cameras: vec![camera("1", "")],
        };
        assert!(matches!(
            config.into_valid_cameras(),
            Err(BridgeError::Startup(_))
        ));
    }

    #[test]
    fn missing_file_is_none() {
        let result = AppConfig::from_file("/nonexistent/micam/config.yaml").unwrap();
        assert!(result.is_none());
    }
}
