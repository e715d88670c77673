//! Remote target readiness
//!
//! The application under test is remote; nothing is spawned. Before any
//! suite runs, both origins are polled until they answer, so a network
//! outage fails the run up front instead of as a wall of scenario timeouts.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use toolshop_common::RunConfig;

use crate::error::{E2eError, E2eResult};

/// The remote UI and API origins under test
pub struct Target {
    ui_base_url: String,
    api_base_url: String,
    client: reqwest::Client,
}

impl Target {
    pub fn new(config: &RunConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            ui_base_url: config.ui_base_url.clone(),
            api_base_url: config.api_base_url.clone(),
            client,
        })
    }

    /// Poll both origins until they respond or the timeout elapses
    pub async fn wait_until_ready(&self, timeout: Duration) -> E2eResult<()> {
        self.wait_for(&self.ui_base_url, timeout).await?;

        // The API serves its health under /status; older deployments only
        // answer on /products.
        let api_status = format!("{}/status", self.api_base_url);
        if self.wait_for(&api_status, timeout).await.is_err() {
            let api_products = format!("{}/products", self.api_base_url);
            self.wait_for(&api_products, timeout).await?;
        }

        info!("target origins are ready");
        Ok(())
    }

    async fn wait_for(&self, url: &str, timeout: Duration) -> E2eResult<()> {
        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;

            match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("readiness check for {} returned {}", url, resp.status());
                    // A reachable origin answering with an error status is
                    // not going to heal by polling.
                    return Err(E2eError::TargetNotReady {
                        target: format!("{} ({})", url, resp.status()),
                        attempts,
                    });
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("waiting for {} ...", url);
                    }
                    if !e.is_connect() && !e.is_timeout() {
                        warn!("readiness check error for {}: {}", url, e);
                    }
                }
            }

            sleep(Duration::from_millis(500)).await;
        }

        Err(E2eError::TargetNotReady {
            target: url.to_string(),
            attempts,
        })
    }
}
