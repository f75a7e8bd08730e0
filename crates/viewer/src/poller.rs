use async_trait::async_trait;
use model::{sort_snapshot, Snapshot};

use crate::{config::ViewerConfig, ViewerError};

/// Request/response source of full snapshots, used alongside (and instead of)
/// the live channel.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync + 'static {
    async fn fetch(&self) -> Result<Snapshot, ViewerError>;
}

pub struct HttpFetcher {
    http: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(config: &ViewerConfig) -> Result<Self, ViewerError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            url: config.snapshot_url(),
        })
    }
}

#[async_trait]
impl SnapshotFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Snapshot, ViewerError> {
        let mut snapshot: Snapshot = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        sort_snapshot(&mut snapshot);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn silent_server_times_out() {
        // accepts connections and never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let mut config = ViewerConfig::new(format!("http://{}", address));
        config.request_timeout = Duration::from_millis(200);
        let fetcher = HttpFetcher::new(&config).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), fetcher.fetch())
            .await
            .unwrap();
        assert!(matches!(result, Err(ViewerError::Http(why)) if why.is_timeout()));
    }
}
