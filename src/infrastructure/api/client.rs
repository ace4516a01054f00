/// Control API HTTP client implementation
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::models::{
    Config, HttpConfig, InstanceInfo, NewResult, NewValidation, ResultInfo, RunInfo, SolverInfo,
};
use crate::domain::ports::ControlApi;

use super::error::ApiError;
use super::retry::RetryPolicy;

/// Authenticated, retrying client for the SMTLab control API.
///
/// Every relative path composes as `{base}/{resource}`; Basic auth is
/// attached to every request; transient failures are retried by
/// [`RetryPolicy`]. Responses are decoded JSON, never cached.
pub struct SmtlabClient {
    /// Reusable HTTP client with connection pooling
    http: ReqwestClient,

    /// Base URL with a guaranteed trailing slash
    base_url: String,

    username: Option<String>,
    password: Option<String>,

    retry: RetryPolicy,
}

impl SmtlabClient {
    /// Build a client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::from_parts(
            &config.api_endpoint,
            config.username.clone(),
            config.password.clone(),
            &config.http,
        )
    }

    /// Build a client from explicit parts.
    pub fn from_parts(
        endpoint: &str,
        username: Option<String>,
        password: Option<String>,
        http: &HttpConfig,
    ) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .context("Failed to build HTTP client")?;

        let mut base_url = endpoint.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http: client,
            base_url,
            username,
            password,
            retry: RetryPolicy::new(http.max_retries, Duration::from_millis(http.backoff_factor_ms)),
        })
    }

    /// Startup probe: the API must answer `GET solvers`.
    pub async fn health_check(&self) -> Result<()> {
        let _: Vec<SolverInfo> = self.get_json("solvers").await?;
        Ok(())
    }

    /// `GET queues/{name}`: drain pending messages from an
    /// HTTP-mediated queue. The read consumes the messages.
    pub async fn get_queue(&self, name: &str) -> Result<Vec<Value>, ApiError> {
        self.get_json(&format!("queues/{name}")).await
    }

    /// `POST queues/{name}`: append one message to an HTTP-mediated
    /// queue.
    pub async fn post_queue(&self, name: &str, message: &Value) -> Result<(), ApiError> {
        self.post_unit(&format!("queues/{name}"), message).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, body));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .retry
            .execute(|| self.send(Method::GET, path, None))
            .await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        let response = self
            .retry
            .execute(|| self.send(Method::POST, path, Some(body)))
            .await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post_unit(&self, path: &str, body: &Value) -> Result<(), ApiError> {
        self.retry
            .execute(|| self.send(Method::POST, path, Some(body)))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ControlApi for SmtlabClient {
    async fn get_run(&self, run_id: i64) -> Result<RunInfo> {
        Ok(self.get_json(&format!("runs/{run_id}")).await?)
    }

    async fn get_benchmark_instances(&self, benchmark_id: i64) -> Result<Vec<InstanceInfo>> {
        Ok(self
            .get_json(&format!("benchmarks/{benchmark_id}/instances"))
            .await?)
    }

    async fn get_run_results(&self, run_id: i64) -> Result<Vec<ResultInfo>> {
        Ok(self.get_json(&format!("runs/{run_id}/results")).await?)
    }

    async fn post_run_results(&self, run_id: i64, results: &[NewResult]) -> Result<Vec<ResultInfo>> {
        let body = serde_json::to_value(results)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(self
            .post_json(&format!("runs/{run_id}/results"), &body)
            .await?)
    }

    async fn get_result(&self, result_id: i64) -> Result<ResultInfo> {
        Ok(self.get_json(&format!("results/{result_id}")).await?)
    }

    async fn post_validation(&self, result_id: i64, validations: &[NewValidation]) -> Result<()> {
        let body = serde_json::to_value(validations)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(self
            .post_unit(&format!("results/{result_id}/validation"), &body)
            .await?)
    }

    async fn get_solvers(&self) -> Result<Vec<SolverInfo>> {
        Ok(self.get_json("solvers").await?)
    }
}
