//! Publisher that hands the raw bitstream to an external `ffmpeg`.
//!
//! Frames are piped into ffmpeg's stdin and re-muxed (no transcoding) into
//! an RTSP/TCP push. ffmpeg's stderr is forwarded to the log.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};

use super::VideoPublisher;
use crate::config::Codec;
use crate::error::{BridgeError, Result};

const FFMPEG: &str = "ffmpeg";

/// How long ffmpeg gets to flush and exit after SIGINT.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// ffmpeg command line for publishing `codec` read from stdin to `rtsp_url`.
pub fn ffmpeg_args(codec: &Codec, rtsp_url: &str) -> Vec<String> {
    [
        "-y",
        "-v",
        "error",
        "-hide_banner",
        "-use_wallclock_as_timestamps",
        "1",
        "-analyzeduration",
        "20000000",
        "-probesize",
        "20000000",
        "-f",
        codec.as_str(),
        "-i",
        "pipe:0",
        "-c:v",
        "copy",
        "-c:a",
        "copy",
        "-f",
        "rtsp",
        "-rtsp_transport",
        "tcp",
        rtsp_url,
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Streams frames through a child `ffmpeg` process.
pub struct SubprocessPublisher {
    stdin: tokio::sync::Mutex<Option<ChildStdin>>,
    child: Mutex<Option<Child>>,
}

impl SubprocessPublisher {
    /// Spawn ffmpeg publishing to `rtsp_url`.
    pub fn spawn(codec: &Codec, rtsp_url: &str) -> Result<Self> {
        Self::spawn_program(FFMPEG, &ffmpeg_args(codec, rtsp_url))
    }

    fn spawn_program(program: &str, args: &[String]) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BridgeError::Transport(format!("failed to start {program}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::Transport(format!("{program} stdin not captured")))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::warn!(target: "micam::ffmpeg", "{line}");
                }
            });
        }

        tracing::info!(program, pid = child.id(), "publisher subprocess started");

        Ok(Self {
            stdin: tokio::sync::Mutex::new(Some(stdin)),
            child: Mutex::new(Some(child)),
        })
    }
}

#[async_trait]
impl VideoPublisher for SubprocessPublisher {
    async fn write(&self, data: &[u8]) -> Result<()> {
        let mut stdin = self.stdin.lock().await;
        match stdin.as_mut() {
            Some(pipe) => pipe
                .write_all(data)
                .await
                .map_err(|e| BridgeError::Write(format!("ffmpeg stdin: {e}"))),
            None => Ok(()),
        }
    }

    async fn close(&self) {
        let Some(mut child) = self.child.lock().take() else {
            return;
        };

        // Ask ffmpeg to finish the RTSP session cleanly. A blocked write
        // fails once the process exits, which releases the stdin lock.
        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
                    tracing::debug!(pid, error = %e, "failed to signal publisher subprocess");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = child.start_kill() {
                tracing::debug!(error = %e, "failed to stop publisher subprocess");
            }
        }

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => tracing::info!(code = ?status.code(), "publisher subprocess exited"),
            Ok(Err(e)) => tracing::warn!(error = %e, "waiting for publisher subprocess failed"),
            Err(_) => {
                tracing::warn!("publisher subprocess did not exit in time, killing");
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "failed to kill publisher subprocess");
                }
            }
        }

        self.stdin.lock().await.take();
    }
}
