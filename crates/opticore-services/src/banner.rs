//! Banner generation client for the n8n webhook.
//!
//! Submits two images plus a prompt and reconciles whatever the workflow
//! answers with. The happy path is one long synchronous call that returns a
//! result URL; when that fails — network error, non-2xx, or a 2xx body with
//! no recognizable URL — the same payload is resubmitted once in async mode,
//! expecting a quick job id, and the status endpoint is polled on a fixed
//! cadence until the URL appears or the time budget runs out. Running out of
//! budget is a reported outcome, not an error.

use crate::truncate_body;
use crate::webhook::{self, PollStatus};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use opticore_core::config::BannerConfig;
use opticore_core::{OptiCoreError, Result};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(220);
const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_POLL_BUDGET: Duration = Duration::from_secs(120);

/// A banner generation request: two raw image payloads and an instruction.
#[derive(Debug, Clone)]
pub struct BannerRequest {
    pub image1: Vec<u8>,
    pub image2: Vec<u8>,
    pub prompt: String,
}

/// Terminal outcome of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerOutcome {
    /// The banner is available at this URL.
    Ready(String),
    /// The job was accepted but no URL arrived within the polling window;
    /// the caller can check again later with [`BannerClient::fetch_status`].
    Pending { job_id: String },
}

/// Client that talks to the banner webhook and its optional status endpoint.
#[derive(Clone)]
pub struct BannerClient {
    client: Client,
    webhook_url: String,
    status_url: Option<String>,
    sync_timeout: Duration,
    fallback_timeout: Duration,
    poll_interval: Duration,
    poll_budget: Duration,
}

impl BannerClient {
    /// Creates a client for the given webhook URL, with no status endpoint.
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
            status_url: None,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_budget: DEFAULT_POLL_BUDGET,
        }
    }

    /// Loads endpoint configuration from the environment.
    pub fn try_from_env() -> Result<Self> {
        Ok(Self::from_config(&BannerConfig::from_env()?))
    }

    pub fn from_config(config: &BannerConfig) -> Self {
        let mut client = Self::new(config.webhook_url.clone());
        client.status_url = config.status_url.clone();
        client
    }

    /// Sets the status endpoint used by the polling phase.
    pub fn with_status_url(mut self, status_url: impl Into<String>) -> Self {
        self.status_url = Some(status_url.into());
        self
    }

    /// Overrides the synchronous submission timeout.
    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    /// Overrides the async fallback submission timeout.
    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = timeout;
        self
    }

    /// Overrides the polling cadence and total budget.
    pub fn with_polling(mut self, interval: Duration, budget: Duration) -> Self {
        self.poll_interval = interval;
        self.poll_budget = budget;
        self
    }

    /// Runs the full generation flow: synchronous attempt, async fallback,
    /// fixed-cadence polling. Blocks the caller for up to the sum of the
    /// three phase budgets (several minutes worst case); there is no retry
    /// beyond the single fallback submission.
    pub async fn generate(&self, request: &BannerRequest) -> Result<BannerOutcome> {
        if request.image1.is_empty() || request.image2.is_empty() {
            return Err(OptiCoreError::invalid_request(
                "both images are required and must be non-empty",
            ));
        }

        match self.submit_sync(request).await {
            Ok(url) => return Ok(BannerOutcome::Ready(url)),
            Err(err) if err.triggers_fallback() => {
                // A 2xx body with no extractable URL lands here too; the
                // workflow is assumed to have switched to async responses.
                warn!(error = %err, "synchronous banner attempt failed, trying async fallback");
            }
            Err(err) => return Err(err),
        }

        let job_id = self.submit_async(request).await?;
        info!(job_id = %job_id, "banner job accepted, polling for completion");
        self.poll_until_ready(&job_id).await
    }

    /// Fetches the current status of a job. Without a configured status
    /// endpoint this is a no-op returning the empty pair, as are transport
    /// errors and unparseable bodies — a single failed poll never aborts
    /// the loop.
    pub async fn fetch_status(&self, job_id: &str) -> PollStatus {
        let Some(status_url) = self.status_url.as_deref() else {
            return PollStatus::default();
        };

        let response = self
            .client
            .get(status_url)
            .query(&[("job_id", job_id)])
            .timeout(DEFAULT_POLL_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                let json_body = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|ct| ct.to_ascii_lowercase().contains("json"))
                    .unwrap_or(false);
                if !json_body {
                    return PollStatus::default();
                }
                match response.text().await {
                    Ok(body) => webhook::parse_poll_body(&body),
                    Err(_) => PollStatus::default(),
                }
            }
            _ => PollStatus::default(),
        }
    }

    async fn submit_sync(&self, request: &BannerRequest) -> Result<String> {
        debug!(url = %self.webhook_url, "submitting banner request (sync)");
        let response = self
            .client
            .post(&self.webhook_url)
            .multipart(Self::form(request))
            .timeout(self.sync_timeout)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(OptiCoreError::Http {
                service: "n8n webhook",
                status: status.as_u16(),
                body: truncate_body(&body, 400),
            });
        }

        webhook::extract_url(&body, content_type.as_deref())
            .ok_or_else(|| OptiCoreError::NoResultUrl(truncate_body(&body, 400)))
    }

    async fn submit_async(&self, request: &BannerRequest) -> Result<String> {
        debug!(url = %self.webhook_url, "submitting banner request (async fallback)");
        let response = self
            .client
            .post(&self.webhook_url)
            .multipart(Self::form(request))
            .timeout(self.fallback_timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(OptiCoreError::Http {
                service: "n8n webhook",
                status: status.as_u16(),
                body: truncate_body(&body, 400),
            });
        }

        webhook::extract_job_id(&body).ok_or_else(|| OptiCoreError::NoJobId(truncate_body(&body, 200)))
    }

    async fn poll_until_ready(&self, job_id: &str) -> Result<BannerOutcome> {
        if self.status_url.is_none() {
            debug!("no status endpoint configured, skipping the polling phase");
            return Ok(BannerOutcome::Pending {
                job_id: job_id.to_string(),
            });
        }

        let deadline = Instant::now() + self.poll_budget;
        while Instant::now() < deadline {
            let poll = self.fetch_status(job_id).await;
            if let Some(url) = poll.banner_url {
                return Ok(BannerOutcome::Ready(url));
            }
            debug!(job_id = %job_id, status = ?poll.status, "banner job still pending");
            sleep(self.poll_interval).await;
        }

        Ok(BannerOutcome::Pending {
            job_id: job_id.to_string(),
        })
    }

    fn form(request: &BannerRequest) -> Form {
        let mut form = Form::new();
        for (name, value) in Self::form_fields(request) {
            form = form.text(name, value);
        }
        form
    }

    /// Multipart field set for a request. Plain standard base64, no data-URL
    /// prefix; the workflow decodes the fields itself.
    fn form_fields(request: &BannerRequest) -> [(&'static str, String); 3] {
        [
            ("image1_base64", BASE64_STANDARD.encode(&request.image1)),
            ("image2_base64", BASE64_STANDARD.encode(&request.image2)),
            ("prompt", request.prompt.trim().to_string()),
        ]
    }
}
