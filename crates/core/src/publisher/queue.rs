//! Bounded write queue between the camera reader and a blocking writer.
//!
//! ```text
//!  reader task ──push()──▶ [ bounded FIFO ] ──▶ writer task ──▶ FrameWriter
//!                 │
//!                 └─ full? drop the frame, count it, warn
//! ```
//!
//! The queue is lossy on purpose: a slow RTSP server must never stall the
//! camera connection, so when the FIFO is full the newest frame is dropped
//! instead of blocking the producer. Drops are counted in
//! [`WriteQueue::dropped`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{BridgeError, Result};

/// Queue capacity used by the native publisher.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Downstream side of a [`WriteQueue`], driven by exactly one writer task.
#[async_trait]
pub trait FrameWriter: Send + 'static {
    /// Deliver one frame. An error stops the writer task.
    async fn write_frame(&mut self, frame: Bytes) -> Result<()>;

    /// Release downstream resources once the queue has been drained.
    async fn finish(&mut self) {}
}

/// What [`WriteQueue::push`] did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    /// Queued for the writer task.
    Queued,
    /// Queue was full; the frame was dropped.
    Dropped,
    /// The queue is closing; the frame was discarded.
    Closing,
}

/// Bounded FIFO with a single writer task and drop-on-full backpressure.
pub struct WriteQueue {
    tx: mpsc::Sender<Bytes>,
    capacity: usize,
    /// Receiver parked here until [`start`](Self::start) hands it to the writer.
    pending: Mutex<Option<mpsc::Receiver<Bytes>>>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    closing: AtomicBool,
    dropped: AtomicU64,
}

impl WriteQueue {
    /// Create a queue with no writer attached yet.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            capacity,
            pending: Mutex::new(Some(rx)),
            shutdown: Mutex::new(None),
            worker: Mutex::new(None),
            closing: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    /// Spawn the writer task. Frames pushed before this call are delivered
    /// first, in order. Calling it a second time has no effect.
    pub fn start<W: FrameWriter>(&self, writer: W) {
        let Some(rx) = self.pending.lock().take() else {
            tracing::warn!("write queue already started");
            return;
        };
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        *self.shutdown.lock() = Some(shutdown_tx);
        *self.worker.lock() = Some(tokio::spawn(write_loop(rx, shutdown_rx, writer)));
    }

    /// Copy `data` into the queue without waiting.
    ///
    /// Fails only when the writer task has stopped because a downstream
    /// write failed.
    pub fn push(&self, data: &[u8]) -> Result<Enqueue> {
        if self.closing.load(Ordering::SeqCst) {
            return Ok(Enqueue::Closing);
        }

        match self.tx.try_send(Bytes::copy_from_slice(data)) {
            Ok(()) => Ok(Enqueue::Queued),
            Err(mpsc::error::TrySendError::Full(frame)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(bytes = frame.len(), dropped, "write queue full, dropping frame");
                Ok(Enqueue::Dropped)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                if self.closing.load(Ordering::SeqCst) {
                    Ok(Enqueue::Closing)
                } else {
                    Err(BridgeError::Write("writer task stopped".into()))
                }
            }
        }
    }

    /// Frames dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Frames waiting for the writer.
    pub fn queued(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    /// Stop accepting frames, let the writer drain everything already
    /// queued, and wait for it to finish. Later calls return immediately.
    pub async fn close(&self) {
        if self.closing.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(shutdown) = self.shutdown.lock().take() {
            let _ = shutdown.send(());
        }

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "writer task panicked");
            }
        }
    }
}

async fn write_loop<W: FrameWriter>(
    mut rx: mpsc::Receiver<Bytes>,
    mut shutdown: oneshot::Receiver<()>,
    mut writer: W,
) {
    loop {
        tokio::select! {
            biased;
            frame = rx.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = writer.write_frame(frame).await {
                    tracing::error!(error = %e, "frame write failed, stopping writer");
                    break;
                }
            }
            _ = &mut shutdown => {
                rx.close();
                let mut drained = 0usize;
                while let Ok(frame) = rx.try_recv() {
                    if let Err(e) = writer.write_frame(frame).await {
                        tracing::warn!(error = %e, "frame write failed while draining");
                        break;
                    }
                    drained += 1;
                }
                tracing::debug!(drained, "write queue drained");
                break;
            }
        }
    }

    // Reject further pushes before tearing the writer down.
    rx.close();
    writer.finish().await;
}
