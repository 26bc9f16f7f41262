//! HTTP client helpers for tests.

use std::time::Duration;

use ladder::model::{LeaderboardPage, RankedEntity};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    pub async fn register(
        &self,
        id: &str,
        name: &str,
        score: i32,
    ) -> Result<RankedEntity, TestClientError> {
        let resp = self
            .client
            .post(self.url("/entities"))
            .json(&json!({ "id": id, "name": name, "score": score }))
            .send()
            .await?;
        Self::parse(resp, 201).await
    }

    pub async fn record(&self, id: &str) -> Result<RankedEntity, TestClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/entities/{id}")))
            .send()
            .await?;
        Self::parse(resp, 200).await
    }

    pub async fn rank(&self, id: &str) -> Result<RankResponse, TestClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/entities/{id}/rank")))
            .send()
            .await?;
        Self::parse(resp, 200).await
    }

    pub async fn update_score(
        &self,
        id: &str,
        score: i32,
    ) -> Result<RankedEntity, TestClientError> {
        let resp = self
            .client
            .put(self.url(&format!("/entities/{id}/score")))
            .json(&json!({ "score": score }))
            .send()
            .await?;
        Self::parse(resp, 200).await
    }

    pub async fn leaderboard(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<LeaderboardPage, TestClientError> {
        let resp = self
            .client
            .get(self.url(&format!(
                "/leaderboard?page={page}&page_size={page_size}"
            )))
            .send()
            .await?;
        Self::parse(resp, 200).await
    }

    pub async fn around(
        &self,
        id: &str,
        context_size: u32,
    ) -> Result<LeaderboardPage, TestClientError> {
        let resp = self
            .client
            .get(self.url(&format!(
                "/entities/{id}/around?context_size={context_size}"
            )))
            .send()
            .await?;
        Self::parse(resp, 200).await
    }

    pub async fn health(&self) -> Result<HealthResponse, TestClientError> {
        let resp = self.client.get(self.url("/health")).send().await?;
        Self::parse(resp, 200).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
        expected: u16,
    ) -> Result<T, TestClientError> {
        match resp.status().as_u16() {
            status if status == expected => Ok(resp.json().await?),
            400 => Err(TestClientError::BadRequest(resp.text().await?)),
            404 => Err(TestClientError::NotFound(resp.text().await?)),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(TestClientError::UnexpectedStatus(status, body))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RankResponse {
    pub id: String,
    pub rank: u64,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unexpected status {0}: {1}")]
    UnexpectedStatus(u16, String),
}
