//! Per-camera supervisor.
//!
//! A [`Bridge`] runs streaming cycles until it is closed:
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────────┐
//!  │ start publisher ─▶ login ─▶ open WebSocket ─▶ pump frames        │
//!  │        │             │            │               │              │
//!  │        └─────────────┴── error ───┴───── end ─────┘              │
//!  │                              │                                   │
//!  │                   close publisher, sleep(backoff)                │
//!  └──────────────────────────────┴───────────────────────────────────┘
//! ```
//!
//! Backoff resets once the WebSocket is up, so a camera that streams for a
//! while and then drops reconnects after one second.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backoff::Backoff;
use crate::config::StreamConfig;
use crate::error::Result;
use crate::login::SessionClient;
use crate::publisher::{self, VideoPublisher};
use crate::source::{self, FrameSource};

#[derive(Default)]
struct BridgeState {
    publisher: Option<Arc<dyn VideoPublisher>>,
    closed: bool,
}

/// Supervises one camera's camera-to-RTSP pipeline.
pub struct Bridge {
    config: Arc<StreamConfig>,
    session: SessionClient,
    state: Mutex<BridgeState>,
    /// Held while a publisher is being closed.
    closing: tokio::sync::Mutex<()>,
}

impl Bridge {
    pub fn new(config: StreamConfig) -> Result<Self> {
        let session = SessionClient::new(&config.base_url, &config.username, &config.password)?;
        Ok(Self {
            config: Arc::new(config),
            session,
            state: Mutex::new(BridgeState::default()),
            closing: tokio::sync::Mutex::new(()),
        })
    }

    pub fn camera_id(&self) -> &str {
        &self.config.camera_id
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Reconnect loop. Returns once [`close`](Self::close) has been called
    /// and the current cycle and backoff sleep have finished.
    pub async fn run(&self) {
        let mut backoff = Backoff::default();

        loop {
            if self.is_closed() {
                break;
            }

            match self.run_cycle(&mut backoff).await {
                Ok(()) => tracing::info!("camera stream ended"),
                Err(e) => tracing::warn!(error = %e, "streaming cycle failed"),
            }

            if self.is_closed() {
                break;
            }

            let delay = backoff.on_failure();
            tracing::info!(delay_secs = delay.as_secs_f32(), "reconnecting after delay");
            tokio::time::sleep(delay).await;
        }

        tracing::info!("bridge stopped");
    }

    /// Mark the bridge closed and close the active publisher, if any.
    /// Returns once no publisher is being closed. Only the first call has
    /// an effect.
    pub async fn close(&self) {
        let publisher = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.publisher.take()
        };

        // Waits for a cycle that is still draining its publisher.
        let _closing = self.closing.lock().await;
        if let Some(publisher) = publisher {
            publisher.close().await;
        }
    }

    async fn run_cycle(&self, backoff: &mut Backoff) -> Result<()> {
        let publisher = publisher::start(&self.config).await?;
        if !self.install(&publisher) {
            publisher.close().await;
            return Ok(());
        }

        let result = self.stream(publisher.as_ref(), backoff).await;
        self.release(&publisher).await;
        result
    }

    async fn stream(&self, publisher: &dyn VideoPublisher, backoff: &mut Backoff) -> Result<()> {
        self.session.login().await?;
        tracing::info!("login successful");

        let url = source::stream_url(
            &self.config.base_url,
            &self.config.camera_id,
            &self.config.channel,
        );
        tracing::info!(%url, "connecting to camera stream");
        let cookie = self.session.cookie_header_for(&url);
        let source = FrameSource::connect(&url, cookie.as_deref()).await?;
        tracing::info!("camera stream connected, waiting for keyframe");
        backoff.on_success();

        let end = source.pump(&self.config.video_codec, publisher).await?;
        tracing::debug!(?end, "camera stream finished");
        Ok(())
    }

    /// Make `publisher` the active one. Returns false if the bridge was
    /// closed in the meantime.
    fn install(&self, publisher: &Arc<dyn VideoPublisher>) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.publisher = Some(Arc::clone(publisher));
        true
    }

    /// Close `publisher` unless [`close`](Self::close) already took it.
    async fn release(&self, publisher: &Arc<dyn VideoPublisher>) {
        let _closing = self.closing.lock().await;
        let owned = {
            let mut state = self.state.lock();
            match &state.publisher {
                Some(current) if Arc::ptr_eq(current, publisher) => state.publisher.take(),
                _ => None,
            }
        };
        if let Some(publisher) = owned {
            publisher.close().await;
        }
    }
}
