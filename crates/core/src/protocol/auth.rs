use base64::prelude::{BASE64_STANDARD, Engine as _};

/// Credentials taken from the `user:pass@` part of the target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// `Authorization` header value for HTTP Basic (RFC 7617), which
    /// RTSP servers accept as RFC 2326 §12.5.
    pub fn basic_authorization(&self) -> String {
        let token = BASE64_STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

/// Whether a `WWW-Authenticate` challenge offers the Basic scheme.
pub fn offers_basic(challenge: &str) -> bool {
    challenge
        .split_whitespace()
        .next()
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("basic"))
}
