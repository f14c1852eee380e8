//! Camera-side WebSocket feed.
//!
//! Each binary message on the stream is one encoded frame. The reader
//! discards frames until the first keyframe so downstream decoders always
//! start on a clean reference, then forwards everything in arrival order.

use futures_util::{Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};

use crate::config::Codec;
use crate::error::{BridgeError, Result};
use crate::media::nal;
use crate::publisher::VideoPublisher;

/// WebSocket URL of a camera channel on the server at `base_url`.
///
/// `https` base URLs map to `wss`, everything else to `ws`. A trailing `/`
/// on `base_url` is ignored.
///
/// ```
/// use micam::source::stream_url;
///
/// assert_eq!(
///     stream_url("https://miloco:8000", "42", "0"),
///     "wss://miloco:8000/api/miot/ws/video_stream?camera_id=42&channel=0",
/// );
/// ```
pub fn stream_url(base_url: &str, camera_id: &str, channel: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let scheme = if base_url.starts_with("https") { "wss" } else { "ws" };
    let host = base_url
        .strip_prefix("https://")
        .or_else(|| base_url.strip_prefix("http://"))
        .unwrap_or(base_url);
    format!("{scheme}://{host}/api/miot/ws/video_stream?camera_id={camera_id}&channel={channel}")
}

/// Why a frame stream stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server sent a Close frame.
    Closed,
    /// The connection ended without a Close frame.
    Eof,
}

/// Connected camera feed.
pub struct FrameSource {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl FrameSource {
    /// Open the WebSocket at `url`, sending `cookie` on the upgrade request.
    ///
    /// TLS certificate and hostname checks are disabled for `wss` URLs.
    pub async fn connect(url: &str, cookie: Option<&str>) -> Result<Self> {
        let mut request = url
            .into_client_request()
            .map_err(|e| BridgeError::Transport(format!("invalid stream URL {url}: {e}")))?;
        if let Some(cookie) = cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| BridgeError::Transport(format!("invalid cookie header: {e}")))?;
            request.headers_mut().insert(COOKIE, value);
        }

        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|e| BridgeError::Transport(format!("TLS setup failed: {e}")))?;

        let (stream, response) = tokio_tungstenite::connect_async_tls_with_config(
            request,
            None,
            false,
            Some(Connector::NativeTls(tls)),
        )
        .await?;
        tracing::debug!(status = %response.status(), "WebSocket upgrade complete");

        Ok(Self { stream })
    }

    /// Forward frames to `publisher` until the stream ends or fails.
    pub async fn pump(self, codec: &Codec, publisher: &dyn VideoPublisher) -> Result<StreamEnd> {
        pump_frames(self.stream, codec, publisher).await
    }
}

/// Keyframe-gated forwarding loop over any WebSocket message stream.
///
/// Binary messages are frames; Close ends the stream; other message kinds
/// are ignored. A read error is [`BridgeError::Read`], a publisher error is
/// returned as is.
pub async fn pump_frames<S>(
    mut stream: S,
    codec: &Codec,
    publisher: &dyn VideoPublisher,
) -> Result<StreamEnd>
where
    S: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
{
    let mut waiting_for_keyframe = true;
    let mut skipped = 0u64;

    while let Some(message) = stream.next().await {
        let message = message.map_err(|e| BridgeError::Read(e.to_string()))?;
        match message {
            Message::Binary(frame) => {
                if waiting_for_keyframe {
                    if !nal::is_keyframe(&frame, codec) {
                        skipped += 1;
                        continue;
                    }
                    tracing::info!(skipped, "keyframe detected, starting stream");
                    waiting_for_keyframe = false;
                }
                publisher.write(&frame).await?;
            }
            Message::Close(close) => {
                tracing::info!(?close, "camera stream closed by server");
                return Ok(StreamEnd::Closed);
            }
            _ => {}
        }
    }

    Ok(StreamEnd::Eof)
}
