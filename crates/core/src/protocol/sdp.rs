//! SDP (Session Description Protocol) generation (RFC 4566 / RFC 8866).
//!
//! Produces the body of the ANNOUNCE request describing the outgoing
//! stream:
//!
//! ```text
//! v=0                                          ← protocol version
//! o=- 0 0 IN IP4 <addr>                        ← origin
//! s=<session-name>                             ← session name
//! c=IN IP4 <addr>                              ← connection address
//! t=0 0                                        ← timing (live stream)
//! a=tool:micam-bridge                          ← sender software
//! m=video 0 RTP/AVP 96                         ← media description
//! a=rtpmap:96 H264/90000                       ← codec/clock rate
//! a=fmtp:96 packetization-mode=1               ← codec parameters
//! a=control:trackID=0                          ← track control URL
//! ```

use crate::media::Packetizer;

/// Control attribute of the only track; SETUP targets `<url>/<TRACK_CONTROL>`.
pub const TRACK_CONTROL: &str = "trackID=0";

/// Generate the ANNOUNCE description for a single video track.
pub fn generate_sdp(packetizer: &dyn Packetizer, ip: &str, session_name: &str) -> String {
    let mut sdp: Vec<String> = Vec::new();

    sdp.push("v=0".to_string());
    sdp.push(format!("o=- 0 0 IN IP4 {}", ip));
    sdp.push(format!("s={}", session_name));
    sdp.push(format!("c=IN IP4 {}", ip));
    sdp.push("t=0 0".to_string());
    sdp.push("a=tool:micam-bridge".to_string());
    sdp.push(format!("m=video 0 RTP/AVP {}", packetizer.payload_type()));
    sdp.extend(packetizer.sdp_attributes());
    sdp.push(format!("a=control:{}", TRACK_CONTROL));

    tracing::debug!("SDP: {}", sdp.join("\r\n"));

    format!("{}\r\n", sdp.join("\r\n"))
}
