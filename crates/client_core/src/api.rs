use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::ApiError,
    protocol::{
        ListTemplatesQuery, LoginRequest, LoginResponse, TemplatePage, LOGIN_PATH,
        PUBLIC_TEMPLATES_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::error::RequestFailedError;

/// Remote authentication and template endpoints.
#[async_trait]
pub trait TemplateApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RequestFailedError>;

    async fn list_public_templates(
        &self,
        access_token: &str,
        query: &ListTemplatesQuery,
    ) -> Result<TemplatePage, RequestFailedError>;
}

pub struct HttpTemplateApi {
    http: Client,
    base_url: Url,
}

impl HttpTemplateApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url.trim())
            .with_context(|| format!("invalid api base url: {base_url}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("api base url must start with http:// or https://");
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RequestFailedError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| RequestFailedError::Transport(format!("invalid endpoint {path}: {err}")))
    }
}

#[async_trait]
impl TemplateApi for HttpTemplateApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RequestFailedError> {
        let url = self.endpoint(LOGIN_PATH)?;
        debug!("api: POST {url}");
        let response = self.http.post(url).json(request).send().await?;
        decode_response(response).await
    }

    async fn list_public_templates(
        &self,
        access_token: &str,
        query: &ListTemplatesQuery,
    ) -> Result<TemplatePage, RequestFailedError> {
        let url = self.endpoint(PUBLIC_TEMPLATES_PATH)?;
        debug!(
            "api: GET {url} page={} size={} sort={} direction={}",
            query.page,
            query.size,
            query.sort,
            query.direction.as_str()
        );
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(access_token)
            .send()
            .await?;
        decode_response(response).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    response: Response,
) -> Result<T, RequestFailedError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| RequestFailedError::Decode(err.to_string()));
    }

    let retry_after_header = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    // Error bodies are best effort; a missing or non-JSON body just has no message.
    let body = response.json::<ApiError>().await.unwrap_or_default();

    Err(RequestFailedError::Status {
        status: status.as_u16(),
        message: body.message().map(str::to_owned),
        retry_after: retry_after_header
            .or(body.retry_after_seconds)
            .map(Duration::from_secs),
    })
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
