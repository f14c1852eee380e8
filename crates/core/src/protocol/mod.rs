//! RTSP client-side protocol messages (RFC 2326).
//!
//! The bridge publishes to an RTSP server, so it builds requests and
//! parses responses, the mirror image of a server:
//!
//! ```text
//! ANNOUNCE rtsp://server/live RTSP/1.0\r\n
//! CSeq: 2\r\n
//! Content-Type: application/sdp\r\n
//! Content-Length: 142\r\n
//! \r\n
//! v=0\r\n...
//! ```
//!
//! ## Publishing sequence
//!
//! | Method | RFC section | Purpose |
//! |--------|-------------|---------|
//! | OPTIONS | §10.1 | Capability discovery |
//! | ANNOUNCE | §10.3 | Post the SDP description of the outgoing stream |
//! | SETUP | §10.4 | Negotiate interleaved TCP transport, `mode=record` |
//! | RECORD | §10.11 | Start accepting media |
//! | TEARDOWN | §10.7 | Destroy session |

pub mod auth;
pub mod request;
pub mod response;
pub mod sdp;

pub use request::RtspRequest;
pub use response::RtspResponse;

/// User agent string sent with every request (RFC 2326 §12.41).
pub const USER_AGENT: &str = concat!("micam-bridge/", env!("CARGO_PKG_VERSION"));
