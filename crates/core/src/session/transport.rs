/// Transport requested in SETUP when publishing (RFC 2326 §12.39).
///
/// Media travels interleaved on the RTSP TCP connection itself
/// (§10.12), so no UDP ports are negotiated:
///
/// ```text
/// Client → Server:
///   Transport: RTP/AVP/TCP;unicast;interleaved=0-1;mode=record
///
/// Server → Client:
///   Transport: RTP/AVP/TCP;unicast;interleaved=0-1
/// ```
pub const RECORD_TRANSPORT: &str = "RTP/AVP/TCP;unicast;interleaved=0-1;mode=record";

/// Interleaved channel pair confirmed by the server's `Transport` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportHeader {
    /// Channel carrying RTP.
    pub rtp_channel: u8,
    /// Channel carrying RTCP.
    pub rtcp_channel: u8,
}

impl Default for TransportHeader {
    fn default() -> Self {
        Self {
            rtp_channel: 0,
            rtcp_channel: 1,
        }
    }
}

impl TransportHeader {
    /// Parse the `interleaved=RTP-RTCP` pair from a `Transport` header value.
    ///
    /// ## Examples
    ///
    /// ```
    /// use micam::session::transport::TransportHeader;
    ///
    /// let th = TransportHeader::parse("RTP/AVP/TCP;unicast;interleaved=2-3").unwrap();
    /// assert_eq!(th.rtp_channel, 2);
    /// assert_eq!(th.rtcp_channel, 3);
    ///
    /// assert!(TransportHeader::parse("RTP/AVP;unicast;client_port=8000-8001").is_none());
    /// ```
    pub fn parse(header: &str) -> Option<Self> {
        for part in header.split(';') {
            let part = part.trim();
            if let Some(channels) = part.strip_prefix("interleaved=") {
                let (rtp, rtcp) = match channels.split_once('-') {
                    Some((rtp, rtcp)) => (rtp.parse().ok()?, rtcp.parse().ok()?),
                    None => {
                        let rtp: u8 = channels.parse().ok()?;
                        (rtp, rtp.wrapping_add(1))
                    }
                };
                return Some(TransportHeader {
                    rtp_channel: rtp,
                    rtcp_channel: rtcp,
                });
            }
        }
        None
    }
}

/// Frame one RTP packet for an interleaved channel (RFC 2326 §10.12).
///
/// ```text
/// +------+---------+----------------+-----------------+
/// | '$'  | channel | length (u16 BE)| packet bytes... |
/// +------+---------+----------------+-----------------+
/// ```
///
/// Returns `None` when the packet does not fit the 16-bit length field.
pub fn interleaved_frame(channel: u8, packet: &[u8]) -> Option<Vec<u8>> {
    let len = u16::try_from(packet.len()).ok()?;
    let mut frame = Vec::with_capacity(4 + packet.len());
    frame.push(b'$');
    frame.push(channel);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(packet);
    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_interleaved_pair() {
        let th = TransportHeader::parse("RTP/AVP/TCP;unicast;interleaved=0-1").unwrap();
        assert_eq!(th, TransportHeader::default());
    }

    #[test]
    fn parse_single_channel() {
        let th = TransportHeader::parse("RTP/AVP/TCP;interleaved=4").unwrap();
        assert_eq!(th.rtp_channel, 4);
        assert_eq!(th.rtcp_channel, 5);
    }

    #[test]
    fn parse_no_interleaved() {
        assert!(TransportHeader::parse("RTP/AVP;unicast").is_none());
    }

    #[test]
    fn frame_layout() {
        let frame = interleaved_frame(0, &[0x80, 0x60, 0x00, 0x01]).unwrap();
        assert_eq!(frame, vec![b'$', 0, 0x00, 0x04, 0x80, 0x60, 0x00, 0x01]);
    }

    #[test]
    fn frame_too_large() {
        assert!(interleaved_frame(0, &vec![0u8; 70_000]).is_none());
    }
}
