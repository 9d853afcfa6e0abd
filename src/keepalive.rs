//! Periodic self-ping for hosting platforms that idle quiet processes.
//!
//! When a keep-alive URL is configured, a background task issues a `GET` to it
//! every interval. Failures are logged and never stop the task.

use std::time::Duration;

use reqwest::StatusCode;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};
use url::Url;

/// Timeout for a single ping.
const PING_TIMEOUT: Duration = Duration::from_secs(30);

/// Background pinger.
#[derive(Clone)]
pub struct KeepAlive {
    client: reqwest::Client,
    url: Url,
    interval: Duration,
}

impl KeepAlive {
    pub fn new(url: Url, interval: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(PING_TIMEOUT).build()?;
        Ok(Self {
            client,
            url,
            interval,
        })
    }

    /// Issue a single ping.
    pub async fn ping(&self) -> Result<StatusCode, reqwest::Error> {
        let response = self.client.get(self.url.clone()).send().await?;
        Ok(response.status())
    }

    /// Ping every interval until the returned handle is aborted.
    ///
    /// The first ping happens one interval after spawning.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            url = %self.url,
            interval_secs = self.interval.as_secs(),
            "Keep-alive enabled"
        );

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match self.ping().await {
                    Ok(status) if status.is_success() => {
                        info!(url = %self.url, status = status.as_u16(), "Keep-alive ping sent");
                    }
                    Ok(status) => {
                        warn!(
                            url = %self.url,
                            status = status.as_u16(),
                            "Keep-alive ping got non-success status"
                        );
                    }
                    Err(e) => {
                        error!(url = %self.url, error = %e, "Keep-alive ping failed");
                    }
                }
            }
        })
    }
}
