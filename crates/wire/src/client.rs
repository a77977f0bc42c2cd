// SPDX-License-Identifier: MIT

//! The coordinator's HTTP API, as consumed by the agent worker and job
//! runner. Every call goes through [`Coordinator`] so `ja-engine`/`ja-daemon`
//! can be tested against [`crate::fake::FakeCoordinator`] instead of a real
//! network.

use crate::classifier::HttpRetryClassifier;
use crate::dto::{
    ConnectRequest, FinishJobRequest, JobState, JobStateResponse, PingOutcome, PingResponseBody,
    SaveHeaderTimesRequest, StartJobRequest, UploadChunkRequest,
};
use crate::error::CoordinatorError;
use async_trait::async_trait;
use backoff::backoff::Backoff;
use ja_core::{Job, JobId, JobStatus, LogChunk, RetryClassifier, RetryPolicy};
use std::collections::BTreeMap;
use std::time::Duration;

/// Everything the job execution core needs from the coordinator. Described
/// only by the shape the core consumes — the transport is an implementation
/// detail of [`HttpCoordinator`].
#[async_trait]
pub trait Coordinator: Send + Sync + 'static {
    async fn connect(&self, agent_id: &str, version: &str) -> Result<(), CoordinatorError>;
    async fn disconnect(&self) -> Result<(), CoordinatorError>;
    async fn heartbeat(&self) -> Result<(), CoordinatorError>;
    async fn ping(&self) -> Result<PingOutcome, CoordinatorError>;
    async fn accept_job(&self, job_id: &JobId) -> Result<Job, CoordinatorError>;
    async fn start_job(&self, job_id: &JobId, started_at_ms: u64) -> Result<(), CoordinatorError>;
    async fn get_job_state(&self, job_id: &JobId) -> Result<JobState, CoordinatorError>;
    async fn upload_chunk(&self, job_id: &JobId, chunk: &LogChunk) -> Result<(), CoordinatorError>;
    async fn save_header_times(
        &self,
        job_id: &JobId,
        times: BTreeMap<String, String>,
    ) -> Result<(), CoordinatorError>;
    async fn finish_job(&self, job_id: &JobId, status: &JobStatus) -> Result<(), CoordinatorError>;
}

/// Adapts a [`ja_core::RetryPolicy`]'s delay sequence to the `backoff` crate's
/// [`Backoff`] trait so `ja-wire` drives retries through the same executor
/// the rest of the workspace uses, rather than hand-rolling a loop.
struct PolicyBackoff {
    policy: RetryPolicy,
    attempt: u32,
}

impl PolicyBackoff {
    fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }
}

impl Backoff for PolicyBackoff {
    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if !self.policy.permits_attempt(self.attempt + 1) {
            return None;
        }
        self.policy.delay_for(self.attempt, rand::random::<f64>())
    }

    fn reset(&mut self) {
        self.attempt = 0;
    }
}

async fn run_with_policy<T, F, Fut>(
    policy: RetryPolicy,
    op: F,
) -> Result<T, CoordinatorError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, CoordinatorError>>,
{
    let classifier = HttpRetryClassifier;
    backoff::future::retry(PolicyBackoff::new(policy), || async {
        match op().await {
            Ok(v) => Ok(v),
            Err(err) if classifier.is_retryable(&err) => {
                tracing::warn!(error = %err, "retrying coordinator call");
                Err(backoff::Error::transient(err))
            }
            Err(err) => Err(backoff::Error::permanent(err)),
        }
    })
    .await
}

/// `reqwest`-backed [`Coordinator`]. Holds the agent's registration token and
/// coordinator base URL; per-job tokens are passed to [`Coordinator::start_job`]
/// via headers constructed at call time.
pub struct HttpCoordinator {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpCoordinator {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<String, CoordinatorError> {
        let response = builder.bearer_auth(&self.token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(CoordinatorError::from_status(status, body))
        }
    }
}

#[async_trait]
impl Coordinator for HttpCoordinator {
    async fn connect(&self, agent_id: &str, version: &str) -> Result<(), CoordinatorError> {
        let body = ConnectRequest { agent_id, version };
        run_with_policy(RetryPolicy::fixed(10, Duration::from_secs(5)), || async {
            self.send(self.http.post(self.url("connect")).json(&body)).await.map(drop)
        })
        .await
    }

    async fn disconnect(&self) -> Result<(), CoordinatorError> {
        run_with_policy(RetryPolicy::fixed(10, Duration::from_secs(5)), || async {
            self.send(self.http.post(self.url("disconnect"))).await.map(drop)
        })
        .await
    }

    async fn heartbeat(&self) -> Result<(), CoordinatorError> {
        // No retry: a missed heartbeat is logged and ignored by the caller.
        self.send(self.http.post(self.url("heartbeat"))).await.map(drop)
    }

    async fn ping(&self) -> Result<PingOutcome, CoordinatorError> {
        let body = self.send(self.http.get(self.url("ping"))).await?;
        let parsed: PingResponseBody = serde_json::from_str(&body)?;
        Ok(parsed.into())
    }

    async fn accept_job(&self, job_id: &JobId) -> Result<Job, CoordinatorError> {
        let path = format!("accept-job/{}", job_id.as_str());
        let body = run_with_policy(RetryPolicy::fixed(30, Duration::from_secs(3)), || async {
            self.send(self.http.put(self.url(&path))).await
        })
        .await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn start_job(&self, job_id: &JobId, started_at_ms: u64) -> Result<(), CoordinatorError> {
        let request = StartJobRequest { id: job_id.as_str().to_string(), started_at: started_at_ms };
        run_with_policy(RetryPolicy::fixed(30, Duration::from_secs(5)), || async {
            self.send(self.http.put(self.url("start-job")).json(&request)).await.map(drop)
        })
        .await
    }

    async fn get_job_state(&self, job_id: &JobId) -> Result<JobState, CoordinatorError> {
        let path = format!("get-job-state/{}", job_id.as_str());
        // No retry: the cancel poller calls this on its own cadence anyway.
        let body = self.send(self.http.get(self.url(&path))).await?;
        let parsed: JobStateResponse = serde_json::from_str(&body)?;
        Ok(parsed.state)
    }

    async fn upload_chunk(&self, job_id: &JobId, chunk: &LogChunk) -> Result<(), CoordinatorError> {
        let path = format!("upload-chunk/{}", job_id.as_str());
        let request: UploadChunkRequest = chunk.into();
        run_with_policy(
            RetryPolicy::forever_with_jitter(Duration::from_secs(1), Duration::from_millis(100)),
            || async { self.send(self.http.post(self.url(&path)).json(&request)).await.map(drop) },
        )
        .await
    }

    async fn save_header_times(
        &self,
        job_id: &JobId,
        times: BTreeMap<String, String>,
    ) -> Result<(), CoordinatorError> {
        let path = format!("save-header-times/{}", job_id.as_str());
        let request = SaveHeaderTimesRequest { times };
        run_with_policy(RetryPolicy::fixed(10, Duration::from_secs(5)), || async {
            self.send(self.http.post(self.url(&path)).json(&request)).await.map(drop)
        })
        .await
    }

    async fn finish_job(&self, job_id: &JobId, status: &JobStatus) -> Result<(), CoordinatorError> {
        let request = FinishJobRequest::from_status(job_id.as_str(), status);
        run_with_policy(RetryPolicy::forever(Duration::from_secs(1)), || async {
            self.send(self.http.put(self.url("finish-job")).json(&request)).await.map(drop)
        })
        .await
    }
}
