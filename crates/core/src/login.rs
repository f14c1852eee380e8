//! Authenticated HTTP session against the camera server.
//!
//! Login is a JSON POST; the server answers with a session cookie that is
//! kept in a shared jar and later replayed on the WebSocket upgrade.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;

use crate::error::{BridgeError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// HTTP client carrying the login cookie for one camera server.
///
/// Certificate and hostname verification are disabled: camera servers
/// commonly run with self-signed certificates on a LAN.
pub struct SessionClient {
    base_url: String,
    username: String,
    password: String,
    http: Client,
    jar: Arc<Jar>,
}

impl SessionClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            http,
            jar,
        })
    }

    /// POST credentials to `/api/auth/login`, then confirm the session
    /// with [`check_login_status`](Self::check_login_status).
    pub async fn login(&self) -> Result<()> {
        let url = format!("{}/api/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await
            .map_err(|e| BridgeError::Auth(format!("login request failed: {e}")))?;

        if response.status() != StatusCode::OK {
            return Err(BridgeError::Auth(format!(
                "login failed with status: {}",
                response.status().as_u16()
            )));
        }

        self.check_login_status().await
    }

    /// GET `/api/miot/login_status`; anything but 200 means the session is
    /// not usable.
    pub async fn check_login_status(&self) -> Result<()> {
        let url = format!("{}/api/miot/login_status", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BridgeError::Auth(format!("login status request failed: {e}")))?;

        if response.status() != StatusCode::OK {
            return Err(BridgeError::Auth(format!(
                "login status check failed with status: {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }

    /// `Cookie` header value the jar would send to `url`, if any.
    ///
    /// `ws`/`wss` URLs are matched as `http`/`https`, so cookies scoped to
    /// a sub-path such as `/api` are found for the stream endpoint.
    pub fn cookie_header_for(&self, url: &str) -> Option<String> {
        let mut url = Url::parse(url).ok()?;
        let scheme = match url.scheme() {
            "ws" => "http",
            "wss" => "https",
            other => other,
        }
        .to_string();
        url.set_scheme(&scheme).ok()?;
        let value = self.jar.cookies(&url)?;
        value.to_str().ok().map(str::to_string)
    }
}
