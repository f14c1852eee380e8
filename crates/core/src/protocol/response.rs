use crate::error::{BridgeError, ParseErrorKind};

/// A parsed RTSP response head (RFC 2326 §7).
///
/// ```text
/// RTSP/1.0 SP Status-Code SP Reason-Phrase CRLF
/// *(Header: Value CRLF)
/// CRLF
/// ```
///
/// The body, if any, is read separately by the caller using
/// [`content_length`](Self::content_length). Header lookup is
/// case-insensitive per RFC 2326 §4.2.
#[derive(Debug)]
pub struct RtspResponse {
    pub status_code: u16,
    pub reason: String,
    /// Headers as ordered (name, value) pairs, names stored as-received.
    pub headers: Vec<(String, String)>,
}

impl RtspResponse {
    /// Parse a response head: status line, headers, optional blank line.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        let mut lines = raw.lines();

        let status_line = lines.next().ok_or(BridgeError::Parse {
            kind: ParseErrorKind::EmptyResponse,
        })?;

        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        let code = parts.next().and_then(|c| c.parse::<u16>().ok());

        let (Some(status_code), true) = (code, version.starts_with("RTSP/")) else {
            return Err(BridgeError::Parse {
                kind: ParseErrorKind::InvalidStatusLine,
            });
        };
        let reason = parts.next().unwrap_or("").trim().to_string();

        let mut headers = Vec::new();

        for line in lines {
            if line.is_empty() {
                break;
            }

            let colon_pos = line.find(':').ok_or(BridgeError::Parse {
                kind: ParseErrorKind::InvalidHeader,
            })?;

            let name = line[..colon_pos].trim().to_string();
            let value = line[colon_pos + 1..].trim().to_string();

            headers.push((name, value));
        }

        Ok(RtspResponse {
            status_code,
            reason,
            headers,
        })
    }

    /// Look up a header value by name (case-insensitive, per RFC 2326 §4.2).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn cseq(&self) -> Option<u32> {
        self.get_header("CSeq").and_then(|v| v.parse().ok())
    }

    /// Body length announced by the server, 0 when absent.
    pub fn content_length(&self) -> usize {
        self.get_header("Content-Length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Session identifier without the `;timeout=` parameter (RFC 2326 §12.37).
    pub fn session_id(&self) -> Option<&str> {
        self.get_header("Session")
            .map(|v| v.split(';').next().unwrap_or(v).trim())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ok_response() {
        let raw = "RTSP/1.0 200 OK\r\nCSeq: 1\r\nPublic: OPTIONS, ANNOUNCE, SETUP, RECORD\r\n\r\n";
        let resp = RtspResponse::parse(raw).unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.reason, "OK");
        assert!(resp.is_success());
        assert_eq!(resp.cseq(), Some(1));
        assert_eq!(resp.content_length(), 0);
    }

    #[test]
    fn parse_session_with_timeout() {
        let raw = "RTSP/1.0 200 OK\r\nCSeq: 3\r\nSession: 12345678;timeout=60\r\n\r\n";
        let resp = RtspResponse::parse(raw).unwrap();
        assert_eq!(resp.session_id(), Some("12345678"));
    }

    #[test]
    fn parse_multi_word_reason() {
        let raw = "RTSP/1.0 454 Session Not Found\r\nCSeq: 9\r\n\r\n";
        let resp = RtspResponse::parse(raw).unwrap();
        assert_eq!(resp.status_code, 454);
        assert_eq!(resp.reason, "Session Not Found");
        assert!(!resp.is_success());
    }

    #[test]
    fn header_lookup_case_insensitive() {
        let raw = "RTSP/1.0 401 Unauthorized\r\nwww-authenticate: Basic realm=\"x\"\r\n\r\n";
        let resp = RtspResponse::parse(raw).unwrap();
        assert_eq!(resp.get_header("WWW-Authenticate"), Some("Basic realm=\"x\""));
    }

    #[test]
    fn parse_empty_response() {
        assert!(RtspResponse::parse("").is_err());
    }

    #[test]
    fn parse_invalid_status_line() {
        assert!(RtspResponse::parse("HTTP/1.1 200 OK\r\n\r\n").is_err());
        assert!(RtspResponse::parse("RTSP/1.0 abc OK\r\n\r\n").is_err());
    }

    #[test]
    fn parse_invalid_header() {
        assert!(RtspResponse::parse("RTSP/1.0 200 OK\r\nno colon here\r\n\r\n").is_err());
    }
}
