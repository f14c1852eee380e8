use super::Packetizer;
use super::RTP_MTU;
use super::rtp::{RTP_HEADER_LEN, RtpHeader};

/// FU-A NAL unit type (RFC 6184 §5.8).
const FU_A: u8 = 28;

/// FU indicator plus FU header.
const FU_A_OVERHEAD: usize = 2;

const FU_START: u8 = 0x80;
const FU_END: u8 = 0x40;

/// H.264 RTP packetizer (RFC 6184).
///
/// Converts H.264 NAL units into RTP packets using two packetization
/// modes from RFC 6184:
///
/// - **Single NAL Unit** (§5.6): NALs that fit within the MTU are sent
///   as-is in a single RTP packet (12-byte header + NAL bytes).
///
/// - **FU-A Fragmentation** (§5.8): NALs exceeding the MTU are split
///   across multiple RTP packets. Each fragment carries a 2-byte FU
///   header (FU indicator + FU header) before the NAL payload:
///
///   ```text
///   FU indicator:  [F|NRI|Type=28]     (1 byte)
///   FU header:     [S|E|R|NAL_Type]    (1 byte)
///   Fragment data: [...]
///   ```
///
///   - **S** (start): set on the first fragment
///   - **E** (end): set on the last fragment
///   - **NAL_Type**: the original NAL unit type from the first byte
///
/// The MTU bounds the whole RTP packet, header included.
#[derive(Debug)]
pub struct H264Packetizer {
    header: RtpHeader,
    mtu: usize,
}

impl H264Packetizer {
    /// Create with explicit payload type, SSRC and first sequence number.
    pub fn new(pt: u8, ssrc: u32, sequence: u16) -> Self {
        Self {
            header: RtpHeader::new(pt, ssrc, sequence),
            mtu: RTP_MTU,
        }
    }

    /// Create with a random SSRC and initial sequence number (RFC 3550 §5.1, §8.1).
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

impl Packetizer for H264Packetizer {
    /// Single NAL Unit packet when the NAL fits, FU-A fragments otherwise.
    fn packetize(&mut self, nal_unit: &[u8], timestamp: u32, end_of_frame: bool) -> Vec<Vec<u8>> {
        let Some((&nal_header, body)) = nal_unit.split_first() else {
            return Vec::new();
        };

        if nal_unit.len() <= self.max_payload() {
            return vec![self.header.packet(end_of_frame, timestamp, &[], nal_unit)];
        }

        let nal_type = nal_header & 0x1f;
        // F and NRI carry over from the original NAL header.
        let fu_indicator = (nal_header & 0xe0) | FU_A;

        let fragments: Vec<&[u8]> = body.chunks(self.max_payload() - FU_A_OVERHEAD).collect();
        let last = fragments.len() - 1;
        let packets: Vec<Vec<u8>> = fragments
            .iter()
            .enumerate()
            .map(|(i, fragment)| {
                let mut fu_header = nal_type;
                if i == 0 {
                    fu_header |= FU_START;
                }
                if i == last {
                    fu_header |= FU_END;
                }
                self.header.packet(
                    end_of_frame && i == last,
                    timestamp,
                    &[fu_indicator, fu_header],
                    fragment,
                )
            })
            .collect();

        tracing::trace!(nal_type, nal_size = nal_unit.len(), fragments = packets.len(), "FU-A");
        packets
    }

    fn codec_name(&self) -> &'static str {
        "H264"
    }

    fn payload_type(&self) -> u8 {
        self.header.pt
    }

    /// `a=rtpmap` must precede the `a=fmtp` line that references it.
    fn sdp_attributes(&self) -> Vec<String> {
        vec![
            format!(
                "a=rtpmap:{} {}/{}",
                self.payload_type(),
                self.codec_name(),
                self.clock_rate()
            ),
            format!("a=fmtp:{} packetization-mode=1", self.header.pt),
        ]
    }
}
