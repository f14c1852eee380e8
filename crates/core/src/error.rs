//! Error types for the camera bridge.

use std::fmt;

/// Errors that can occur while bridging a camera feed to RTSP.
///
/// Variants map to specific failure modes across the pipeline:
///
/// - **Per-cycle**: [`Transport`](Self::Transport), [`Auth`](Self::Auth),
///   [`Read`](Self::Read), [`Write`](Self::Write). The reconnect loop logs
///   these, ends the cycle and retries after a backoff delay.
/// - **Startup**: [`Config`](Self::Config) skips a single camera,
///   [`Startup`](Self::Startup) is fatal for the process.
/// - **Plumbing**: [`Io`](Self::Io), [`Http`](Self::Http),
///   [`Yaml`](Self::Yaml), [`Rtsp`](Self::Rtsp), [`Parse`](Self::Parse).
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Dialing or handshaking with a remote endpoint failed
    /// (camera WebSocket, RTSP server, ffmpeg spawn).
    #[error("transport error: {0}")]
    Transport(String),

    /// Login or session-status check was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The camera stream was interrupted mid-cycle.
    #[error("stream read error: {0}")]
    Read(String),

    /// The active publisher could not deliver data downstream.
    #[error("publisher write error: {0}")]
    Write(String),

    /// A camera entry is unusable (missing camera id or password).
    #[error("invalid camera config: {0}")]
    Config(String),

    /// No camera could be started.
    #[error("startup failed: {0}")]
    Startup(String),

    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error from the login session.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Config file could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The RTSP server answered a request with a non-2xx status.
    #[error("RTSP {method} rejected: {status} {reason}")]
    Rtsp {
        method: &'static str,
        status: u16,
        reason: String,
    },

    /// Malformed RTSP response or URL.
    #[error("RTSP parse error: {kind}")]
    Parse { kind: ParseErrorKind },
}

/// Specific kind of RTSP parse failure.
#[derive(Debug)]
pub enum ParseErrorKind {
    /// Input was empty (no status line).
    EmptyResponse,
    /// Status line did not have the expected `Version Code Reason` format.
    InvalidStatusLine,
    /// A header line did not contain a colon separator.
    InvalidHeader,
    /// The target URL is not a usable `rtsp://` URL.
    InvalidUrl(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyResponse => write!(f, "empty response"),
            Self::InvalidStatusLine => write!(f, "invalid status line"),
            Self::InvalidHeader => write!(f, "invalid header"),
            Self::InvalidUrl(url) => write!(f, "invalid URL: {url}"),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BridgeError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Convenience alias for `Result<T, BridgeError>`.
pub type Result<T> = std::result::Result<T, BridgeError>;
