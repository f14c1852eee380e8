use super::USER_AGENT;

/// An outgoing RTSP request (RFC 2326 §6).
///
/// Serializes to the standard text format:
///
/// ```text
/// Method SP Request-URI SP RTSP/1.0 CRLF
/// *(Header: Value CRLF)
/// CRLF
/// [body]
/// ```
///
/// Uses a builder pattern: chain [`add_header`](Self::add_header) and
/// [`with_body`](Self::with_body), then call [`serialize`](Self::serialize).
/// `CSeq` is written first and `Content-Length` is computed automatically
/// when a body is present.
#[must_use]
#[derive(Debug, Clone)]
pub struct RtspRequest {
    pub method: &'static str,
    pub uri: String,
    pub cseq: u32,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RtspRequest {
    pub fn new(method: &'static str, uri: &str, cseq: u32) -> Self {
        RtspRequest {
            method,
            uri: uri.to_string(),
            cseq,
            headers: vec![("User-Agent".to_string(), USER_AGENT.to_string())],
            body: None,
        }
    }

    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, content_type: &str, body: String) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        self.body = Some(body);
        self
    }

    /// Serialize to the RTSP text wire format.
    pub fn serialize(&self) -> String {
        let mut request = format!("{} {} RTSP/1.0\r\n", self.method, self.uri);
        request.push_str(&format!("CSeq: {}\r\n", self.cseq));

        for (name, value) in &self.headers {
            request.push_str(&format!("{}: {}\r\n", name, value));
        }

        if let Some(body) = &self.body {
            request.push_str(&format!("Content-Length: {}\r\n", body.len()));
            request.push_str("\r\n");
            request.push_str(body);
        } else {
            request.push_str("\r\n");
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_no_body() {
        let req = RtspRequest::new("OPTIONS", "rtsp://localhost:8554/live", 1);
        let s = req.serialize();
        assert!(s.starts_with("OPTIONS rtsp://localhost:8554/live RTSP/1.0\r\nCSeq: 1\r\n"));
        assert!(s.contains(&format!("User-Agent: {}\r\n", USER_AGENT)));
        assert!(!s.contains("Content-Length"));
        assert!(s.ends_with("\r\n\r\n"));
    }

    #[test]
    fn serialize_with_body() {
        let req = RtspRequest::new("ANNOUNCE", "rtsp://h/live", 2)
            .with_body("application/sdp", "v=0\r\n".to_string());
        let s = req.serialize();
        assert!(s.contains("Content-Type: application/sdp\r\n"));
        assert!(s.contains("Content-Length: 5\r\n"));
        assert!(s.ends_with("\r\n\r\nv=0\r\n"));
    }

    #[test]
    fn extra_headers_kept_in_order() {
        let req = RtspRequest::new("RECORD", "rtsp://h/live", 4)
            .add_header("Session", "abc")
            .add_header("Range", "npt=0.000-");
        let s = req.serialize();
        let session = s.find("Session: abc").unwrap();
        let range = s.find("Range: npt=0.000-").unwrap();
        assert!(session < range);
    }
}
