//! RTSP egress.
//!
//! Two interchangeable back ends sit behind [`VideoPublisher`]:
//!
//! | Back end | Selected by | How frames leave |
//! |----------|-------------|------------------|
//! | [`NativePublisher`] | `use_ffmpeg: false` | RTP over interleaved RTSP/TCP |
//! | [`SubprocessPublisher`] | `use_ffmpeg: true` | piped into `ffmpeg`, which pushes RTSP |

pub mod native;
pub mod queue;
pub mod subprocess;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StreamConfig;
use crate::error::Result;

pub use native::NativePublisher;
pub use subprocess::SubprocessPublisher;

/// A sink for Annex B encoded frames.
#[async_trait]
pub trait VideoPublisher: Send + Sync {
    /// Publish one frame. Writes after [`close`](Self::close) are
    /// discarded and succeed.
    async fn write(&self, data: &[u8]) -> Result<()>;

    /// Flush and release the downstream connection.
    async fn close(&self);
}

/// Start the publisher selected by `config`.
pub async fn start(config: &StreamConfig) -> Result<Arc<dyn VideoPublisher>> {
    if config.use_ffmpeg {
        let publisher = SubprocessPublisher::spawn(&config.video_codec, &config.rtsp_url)?;
        Ok(Arc::new(publisher))
    } else {
        let publisher = NativePublisher::connect(&config.rtsp_url, &config.video_codec).await?;
        Ok(Arc::new(publisher))
    }
}
