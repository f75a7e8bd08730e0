use std::{env, time::Duration};

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const SNAPSHOT_PATH: &str = "/api/v1/parcari/all";
pub const SOCKET_PATH: &str = "/ws/parking";

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub api_url: String,
    pub ws_url: String,
    pub poll_interval: Duration,
    pub ping_interval: Duration,
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
    pub notification_ttl: Duration,
    /// Upper bound for one snapshot request, including the response body.
    pub request_timeout: Duration,
    /// Upper bound for one attempt to open the live channel. An attempt that
    /// runs out counts as a failed one.
    pub connect_timeout: Duration,
}

impl ViewerConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_owned();
        let ws_url = socket_url(&api_url);
        Self {
            api_url,
            ws_url,
            poll_interval: Duration::from_secs(3),
            ping_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_attempts: 5,
            notification_ttl: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// `PARKING_API_URL` defaults to a local server. `PARKING_WS_URL` defaults
    /// to the socket endpoint of that server.
    pub fn from_env() -> Self {
        let mut config =
            Self::new(env::var("PARKING_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned()));
        if let Ok(ws_url) = env::var("PARKING_WS_URL") {
            config.ws_url = ws_url;
        }
        config
    }

    pub fn snapshot_url(&self) -> String {
        format!("{}{}", self.api_url, SNAPSHOT_PATH)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

fn socket_url(api_url: &str) -> String {
    let base = if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        api_url.to_owned()
    };
    format!("{}{}", base, SOCKET_PATH)
}
