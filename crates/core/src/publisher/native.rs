//! In-process RTSP publisher.
//!
//! Frames are queued by [`NativePublisher::write`] and packetized on a
//! dedicated writer task that owns the RTSP session:
//!
//! ```text
//! write(frame) ─▶ WriteQueue ─▶ RtpWriter
//!                                 ├─ split_nal_units
//!                                 ├─ Packetizer::packetize (FU-A / FU)
//!                                 └─ RecordSession::write_packet ('$' framed)
//! ```

use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

use super::VideoPublisher;
use super::queue::{DEFAULT_QUEUE_CAPACITY, FrameWriter, WriteQueue};
use crate::config::Codec;
use crate::error::Result;
use crate::media::{self, Packetizer, nal};
use crate::session::RecordSession;

/// Publishes Annex B frames to an RTSP server over interleaved TCP.
pub struct NativePublisher {
    queue: WriteQueue,
}

impl NativePublisher {
    /// Connect to `rtsp_url`, complete the publish handshake and start the
    /// writer task.
    pub async fn connect(rtsp_url: &str, codec: &Codec) -> Result<Self> {
        let packetizer = media::packetizer_for(codec);
        let session = RecordSession::connect(rtsp_url, packetizer.as_ref()).await?;
        tracing::info!(url = rtsp_url, codec = packetizer.codec_name(), "native RTSP publisher started");
        Ok(Self::start(session, packetizer, DEFAULT_QUEUE_CAPACITY))
    }

    /// Start publishing on an already recording session.
    pub fn start<S>(session: RecordSession<S>, packetizer: Box<dyn Packetizer>, capacity: usize) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let queue = WriteQueue::new(capacity);
        queue.start(RtpWriter::new(session, packetizer));
        Self { queue }
    }

    /// Frames dropped because the write queue was full.
    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }
}

#[async_trait]
impl VideoPublisher for NativePublisher {
    async fn write(&self, data: &[u8]) -> Result<()> {
        self.queue.push(data).map(|_| ())
    }

    async fn close(&self) {
        self.queue.close().await;
        tracing::info!(dropped = self.queue.dropped(), "native RTSP publisher closed");
    }
}

/// Writer side: turns one frame into RTP packets on the session.
struct RtpWriter<S> {
    session: Option<RecordSession<S>>,
    packetizer: Box<dyn Packetizer>,
    epoch: Instant,
    timestamp_base: u32,
}

impl<S> RtpWriter<S> {
    fn new(session: RecordSession<S>, packetizer: Box<dyn Packetizer>) -> Self {
        Self {
            session: Some(session),
            packetizer,
            epoch: Instant::now(),
            timestamp_base: rand::random(),
        }
    }

    /// Media clock for a frame written now.
    fn timestamp(&self) -> u32 {
        let clock = u128::from(self.packetizer.clock_rate());
        let ticks = self.epoch.elapsed().as_micros() * clock / 1_000_000;
        self.timestamp_base.wrapping_add(ticks as u32)
    }
}

#[async_trait]
impl<S> FrameWriter for RtpWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn write_frame(&mut self, frame: Bytes) -> Result<()> {
        // All NAL units of a frame share one timestamp.
        let timestamp = self.timestamp();
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let units = nal::split_nal_units(&frame);
        let last = units.len().saturating_sub(1);
        for (i, unit) in units.iter().enumerate() {
            for packet in self.packetizer.packetize(unit, timestamp, i == last) {
                session.write_packet(&packet).await?;
            }
        }
        Ok(())
    }

    async fn finish(&mut self) {
        if let Some(session) = self.session.take() {
            session.teardown().await;
        }
    }
}
