//! Authenticated session against a single controller.
//!
//! A [`Session`] only exists once the login handshake has completed: the
//! challenge was accepted, a token was issued and the token passed `verify`.
//! Every later call carries that token in `X-Auth-Token`. Tokens are not
//! refreshed behind the caller's back; once the device starts rejecting them,
//! connect again.

use crate::error::{Result, TwinklyError};
use crate::mode::DeviceMode;
use crate::movie::Movie;
use crate::transport::{
    CONTENT_TYPE_JSON, CONTENT_TYPE_OCTET_STREAM, DeviceRequest, DeviceResponse, DeviceTransport,
    HttpTransport, TransportConfig,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use url::Url;

const API_PREFIX: &str = "xled/v1/";
const CHALLENGE_LEN: usize = 32;
/// Subtracted from the device's validity window so the client gives up on a
/// token before the device does.
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::seconds(10);

const LOGIN: &str = "login";
const VERIFY: &str = "verify";
const LED_MODE: &str = "led/mode";
const MOVIE_FULL: &str = "led/movie/full";
const MOVIE_CONFIG: &str = "led/movie/config";

#[derive(Clone)]
struct AuthToken {
    value: String,
    expires_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    authentication_token: Option<String>,
    #[serde(default)]
    authentication_token_expires_in: Option<u64>,
}

pub struct Session {
    hostname: String,
    base_url: Url,
    transport: Arc<dyn DeviceTransport>,
    token: AuthToken,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("hostname", &self.hostname)
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field("expires_at", &self.token.expires_at)
            .finish()
    }
}

impl Session {
    /// Logs in to `hostname` over plain HTTP with default transport settings.
    pub async fn connect(hostname: &str) -> Result<Self> {
        Self::connect_with(hostname, &TransportConfig::default()).await
    }

    pub async fn connect_with(hostname: &str, config: &TransportConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::connect_via(hostname, Arc::new(transport)).await
    }

    /// Runs the login handshake over the given transport.
    ///
    /// Fails without returning a session when either the login call or the
    /// follow-up verify call fails.
    pub async fn connect_via(hostname: &str, transport: Arc<dyn DeviceTransport>) -> Result<Self> {
        let base_url = api_base_url(hostname)?;
        let token = login(transport.as_ref(), &base_url).await?;

        let session = Self {
            hostname: hostname.trim().to_string(),
            base_url,
            transport,
            token,
        };
        session.verify().await?;

        tracing::info!(
            target: "twinkly::session",
            host = %session.hostname,
            expires_at = %session.token.expires_at,
            "session established"
        );
        Ok(session)
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn token(&self) -> &str {
        &self.token.value
    }

    /// Instant after which the token should no longer be relied upon.
    pub fn expires_at(&self) -> OffsetDateTime {
        self.token.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.token.expires_at <= OffsetDateTime::now_utc()
    }

    /// Asks the device to confirm the current token.
    pub async fn verify(&self) -> Result<()> {
        self.post(VERIFY, CONTENT_TYPE_JSON, Bytes::new()).await?;
        Ok(())
    }

    pub async fn set_mode(&self, mode: DeviceMode) -> Result<()> {
        #[derive(Serialize)]
        struct ModeRequest {
            mode: DeviceMode,
        }

        tracing::debug!(target: "twinkly::session", host = %self.hostname, %mode, "setting mode");
        self.post_json(LED_MODE, &ModeRequest { mode }).await?;
        Ok(())
    }

    /// Switches the device off, uploads the frame buffer, then tells the
    /// device how to slice it. Each step waits for the previous response and
    /// the first failure aborts the rest. Bytes already accepted by the device
    /// are left in place.
    pub async fn upload_movie(&self, movie: &Movie) -> Result<()> {
        self.set_mode(DeviceMode::Off).await?;

        let buffer = Bytes::from(movie.encode());
        tracing::debug!(
            target: "twinkly::session",
            host = %self.hostname,
            frames = movie.frame_count(),
            bytes = buffer.len(),
            "uploading movie buffer"
        );
        self.post(MOVIE_FULL, CONTENT_TYPE_OCTET_STREAM, buffer).await?;

        self.post_json(MOVIE_CONFIG, &movie.config()).await?;
        tracing::info!(
            target: "twinkly::session",
            host = %self.hostname,
            leds = movie.led_count(),
            frames = movie.frame_count(),
            frame_delay = movie.frame_delay(),
            "movie uploaded"
        );
        Ok(())
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<DeviceResponse> {
        let body = serde_json::to_vec(body)?;
        self.post(path, CONTENT_TYPE_JSON, Bytes::from(body)).await
    }

    async fn post(
        &self,
        path: &str,
        content_type: &'static str,
        body: Bytes,
    ) -> Result<DeviceResponse> {
        let request = DeviceRequest {
            url: endpoint(&self.base_url, path)?,
            auth_token: Some(self.token.value.clone()),
            content_type,
            body,
        };
        send(self.transport.as_ref(), path, request).await
    }
}

fn api_base_url(hostname: &str) -> Result<Url> {
    let hostname = hostname.trim();
    if hostname.is_empty() {
        return Err(TwinklyError::Config("hostname is empty".into()));
    }
    let url = Url::parse(&format!("http://{hostname}/{API_PREFIX}"))
        .map_err(|err| TwinklyError::Config(format!("invalid hostname '{hostname}': {err}")))?;
    if url.path() != format!("/{API_PREFIX}") {
        return Err(TwinklyError::Config(format!(
            "invalid hostname '{hostname}': unexpected path"
        )));
    }
    Ok(url)
}

fn endpoint(base_url: &Url, path: &str) -> Result<Url> {
    base_url
        .join(path)
        .map_err(|err| TwinklyError::Config(format!("invalid endpoint '{path}': {err}")))
}

async fn login(transport: &dyn DeviceTransport, base_url: &Url) -> Result<AuthToken> {
    #[derive(Serialize)]
    struct LoginRequest {
        challenge: String,
    }

    let mut challenge = [0u8; CHALLENGE_LEN];
    OsRng.fill_bytes(&mut challenge);
    let body = serde_json::to_vec(&LoginRequest {
        challenge: STANDARD.encode(challenge),
    })?;

    let request = DeviceRequest {
        url: endpoint(base_url, LOGIN)?,
        auth_token: None,
        content_type: CONTENT_TYPE_JSON,
        body: Bytes::from(body),
    };
    let response = send(transport, LOGIN, request).await?;
    let issued_at = OffsetDateTime::now_utc();

    let parsed: LoginResponse = serde_json::from_slice(&response.body).map_err(|err| {
        TwinklyError::Authentication(format!("login response was not valid JSON: {err}"))
    })?;
    let value = parsed
        .authentication_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            TwinklyError::Authentication("login response is missing authentication_token".into())
        })?;
    let expires_in = parsed.authentication_token_expires_in.ok_or_else(|| {
        TwinklyError::Authentication(
            "login response is missing authentication_token_expires_in".into(),
        )
    })?;

    Ok(AuthToken {
        value,
        expires_at: token_expiry(issued_at, expires_in)?,
    })
}

/// `issued_at + expires_in - TOKEN_EXPIRY_MARGIN`.
fn token_expiry(issued_at: OffsetDateTime, expires_in: u64) -> Result<OffsetDateTime> {
    let window = i64::try_from(expires_in)
        .ok()
        .map(Duration::seconds)
        .and_then(|window| issued_at.checked_add(window))
        .ok_or_else(|| {
            TwinklyError::Authentication(format!("token lifetime {expires_in}s is out of range"))
        })?;
    Ok(window - TOKEN_EXPIRY_MARGIN)
}

async fn send(
    transport: &dyn DeviceTransport,
    endpoint: &str,
    request: DeviceRequest,
) -> Result<DeviceResponse> {
    let response = transport.post(request).await.map_err(|err| {
        tracing::warn!(target: "twinkly::session", endpoint, error = %err, "request failed");
        err
    })?;

    if response.is_success() {
        return Ok(response);
    }

    tracing::warn!(
        target: "twinkly::session",
        endpoint,
        status = response.status,
        "device rejected request"
    );
    Err(TwinklyError::Device {
        endpoint: endpoint.to_string(),
        status: response.status,
        body: response.text(),
    })
}
