//! Bitstream parsing and RTP packetization.
//!
//! Camera frames arrive as Annex B byte streams. [`nal`] finds NAL unit
//! boundaries and decides whether a frame is a valid stream start; the
//! codec packetizers turn each NAL unit into RTP packets.
//!
//! ## RTP overview (RFC 3550)
//!
//! Every RTP packet carries a 12-byte fixed header ([`rtp::RtpHeader`])
//! containing:
//!
//! - **Sequence number** (16-bit, wrapping, random start): reordering and loss detection.
//! - **Timestamp** (32-bit): 90 kHz media clock for video.
//! - **SSRC** (32-bit): randomly chosen to identify the sender.
//! - **Marker bit**: set on the last packet of an access unit (frame).
//!
//! ## Supported codecs
//!
//! | Codec | Module | RFC |
//! |-------|--------|-----|
//! | H.264 | [`h264`] | [RFC 6184](https://tools.ietf.org/html/rfc6184) |
//! | H.265 | [`h265`] | [RFC 7798](https://tools.ietf.org/html/rfc7798) |

pub mod h264;
pub mod h265;
pub mod nal;
pub mod rtp;

use crate::config::Codec;

/// Dynamic RTP payload type announced for the video track.
pub const VIDEO_PAYLOAD_TYPE: u8 = 96;

/// Maximum RTP packet size, header included.
pub const RTP_MTU: usize = 1200;

/// 90 kHz video clock (RFC 3551 §4).
pub const VIDEO_CLOCK_RATE: u32 = 90_000;

/// Codec-specific RTP packetizer.
///
/// Each supported codec implements this trait, providing:
/// - **Packetization**: splitting one NAL unit into RTP-sized packets
/// - **SDP attributes**: codec parameters for the ANNOUNCE body
///
/// The generic RTP header is handled by [`rtp::RtpHeader`]; packetizers
/// compose it rather than reimplementing header serialization.
pub trait Packetizer: Send + Sync {
    /// Packetize one NAL unit (without start code) into RTP packets.
    ///
    /// Each returned `Vec<u8>` is a complete RTP packet: 12-byte header
    /// (RFC 3550 §5.1) followed by the codec-specific payload. The marker
    /// bit is set on the final packet when `end_of_frame` is true.
    fn packetize(&mut self, nal_unit: &[u8], timestamp: u32, end_of_frame: bool) -> Vec<Vec<u8>>;

    /// Codec name for the SDP `a=rtpmap` attribute (e.g. `"H264"`, `"H265"`).
    fn codec_name(&self) -> &'static str;

    /// RTP payload type number (RFC 3551).
    fn payload_type(&self) -> u8;

    /// RTP clock rate in Hz.
    fn clock_rate(&self) -> u32 {
        VIDEO_CLOCK_RATE
    }

    /// SDP media-level attribute lines for this codec, `a=` prefix included.
    fn sdp_attributes(&self) -> Vec<String>;
}

/// Build the packetizer for `codec`.
///
/// The native publisher only speaks H.264 and H.265; any other codec name
/// falls back to H.264 with a warning.
pub fn packetizer_for(codec: &Codec) -> Box<dyn Packetizer> {
    match codec {
        Codec::H264 => Box::new(h264::H264Packetizer::randomized(VIDEO_PAYLOAD_TYPE)),
        Codec::Hevc => Box::new(h265::H265Packetizer::randomized(VIDEO_PAYLOAD_TYPE)),
        Codec::Other(name) => {
            tracing::warn!(codec = %name, "unknown codec, defaulting to H264");
            Box::new(h264::H264Packetizer::randomized(VIDEO_PAYLOAD_TYPE))
        }
    }
}
