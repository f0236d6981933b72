//! External HTTP health probe
//!
//! The only call in a run with an explicit timeout. Any transport failure is
//! reported as [`ProbeOutcome::Unreachable`]; it never aborts the run.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

use crate::error::InitError;

/// What a single GET against a health endpoint produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint answered with this HTTP status
    Status(u16),
    /// Connection refused, DNS failure, TLS failure or timeout
    Unreachable(String),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// reqwest-backed probe with a bounded timeout
#[derive(Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, InitError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EndpointProbe for HttpProbe {
    #[instrument(skip(self))]
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(status, "Health endpoint answered");
                ProbeOutcome::Status(status)
            }
            Err(e) => {
                debug!(error = %e, "Health endpoint unreachable");
                ProbeOutcome::Unreachable(e.to_string())
            }
        }
    }
}
