//! H.265 (HEVC) RTP packetizer (RFC 7798).
//!
//! Key differences from H.264 (RFC 6184):
//!
//! - **2-byte NAL unit header** (vs 1-byte in H.264).
//!   The NAL type is in bits 1..6 of the first byte:
//!
//!   ```text
//!   +---------------+---------------+
//!   |0|1|2|3|4|5|6|7|0|1|2|3|4|5|6|7|
//!   +-+-------------+-----------+-----+
//!   |F|   Type    |  LayerId  | TID |
//!   +-------------+-----------------+
//!   ```
//!
//! - **Fragmentation Units** (§4.4.3): a 2-byte payload header with
//!   type 49, followed by a 1-byte FU header `[S|E|FuType(6)]`. The
//!   original 2-byte NAL header is not repeated in the fragments.

use super::Packetizer;
use super::RTP_MTU;
use super::rtp::{RTP_HEADER_LEN, RtpHeader};

/// FU payload header type (RFC 7798 §4.4.3).
const FU_TYPE: u8 = 49;

/// Payload header (2 bytes) plus FU header (1 byte).
const FU_OVERHEAD: usize = 3;

/// HEVC NAL unit header length.
const NAL_HEADER_LEN: usize = 2;

/// H.265 RTP packetizer.
#[derive(Debug)]
pub struct H265Packetizer {
    header: RtpHeader,
    mtu: usize,
}

impl H265Packetizer {
    /// Create with explicit payload type, SSRC and first sequence number.
    pub fn new(pt: u8, ssrc: u32, sequence: u16) -> Self {
        Self {
            header: RtpHeader::new(pt, ssrc, sequence),
            mtu: RTP_MTU,
        }
    }

    /// Create with a random SSRC and initial sequence number.
    pub fn randomized(pt: u8) -> Self {
        Self {
            header: RtpHeader::randomized(pt),
            mtu: RTP_MTU,
        }
    }

    fn max_payload(&self) -> usize {
        self.mtu - RTP_HEADER_LEN
    }
}

impl Packetizer for H265Packetizer {
    fn packetize(&mut self, nal_unit: &[u8], timestamp: u32, end_of_frame: bool) -> Vec<Vec<u8>> {
        if nal_unit.is_empty() {
            return Vec::new();
        }
        if nal_unit.len() <= self.max_payload() {
            return vec![self.header.packet(end_of_frame, timestamp, &[], nal_unit)];
        }

        let nal_type = (nal_unit[0] >> 1) & 0x3f;
        // Keep F and the high LayerId bit, replace Type with 49.
        let payload_header = [(nal_unit[0] & 0x81) | (FU_TYPE << 1), nal_unit[1]];
        let body = &nal_unit[NAL_HEADER_LEN..];

        let mut packets = Vec::new();
        let mut fragments = body.chunks(self.max_payload() - FU_OVERHEAD).peekable();
        let mut start = true;
        while let Some(fragment) = fragments.next() {
            let end = fragments.peek().is_none();
            let fu_header = match (start, end) {
                (true, _) => 0x80 | nal_type,
                (false, true) => 0x40 | nal_type,
                (false, false) => nal_type,
            };
            let prefix = [payload_header[0], payload_header[1], fu_header];
            packets.push(self.header.packet(end_of_frame && end, timestamp, &prefix, fragment));
            start = false;
        }

        tracing::trace!(nal_type, nal_size = nal_unit.len(), fragments = packets.len(), "FU");
        packets
    }

    fn codec_name(&self) -> &'static str {
        "H265"
    }

    fn payload_type(&self) -> u8 {
        self.header.pt
    }

    fn sdp_attributes(&self) -> Vec<String> {
        vec![format!(
            "a=rtpmap:{} {}/{}",
            self.payload_type(),
            self.codec_name(),
            self.clock_rate()
        )]
    }
}
