use crate::alert;
use crate::api::favorites::error::FavoriteError;
use crate::api::favorites::interfaces::{
    FavoriteCountsRequest, FavoriteCountsResponse, ToggleFavoriteRequest, ToggleFavoriteResponse,
};
use crate::api::favorites::reconciler::FavoriteApi;
use crate::api::invite::gateway::VisitContext;
use crate::database::favorite::FavoriteCount;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`FavoriteApi`] over HTTP against the invite endpoints of the API server.
#[derive(Clone)]
pub struct HttpFavoriteApi {
    http_client: Client,
    base_url: Url,
    max_retries: u32,
}

impl HttpFavoriteApi {
    #[must_use]
    pub const fn new(http_client: Client, base_url: Url) -> Self {
        Self {
            http_client,
            base_url,
            max_retries: 2,
        }
    }

    /// Retries of a toggle that failed without a definite answer. The server deduplicates by
    /// toggle id, so a retry never counts twice.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, FavoriteError> {
        self.base_url
            .join(path)
            .map_err(|e| FavoriteError::Unavailable(format!("invalid server url: {e}")))
    }

    async fn post_once<B, T>(&self, url: &Url, body: &B) -> Result<T, FavoriteError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let response = self
            .http_client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| FavoriteError::Unavailable(e.to_string()))?;
        parse_response(url, response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, FavoriteError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let url = self.endpoint(path)?;
        let mut attempt = 0;
        loop {
            match self.post_once(&url, body).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("Request to {} failed ({}), retry {}", url, e, attempt);
                }
                Err(e) if e.is_transient() => {
                    alert!("Giving up on {} after {} retries: {}", url, attempt, e);
                    return Err(e);
                }
                result => return result,
            }
        }
    }
}

async fn parse_response<T: DeserializeOwned>(
    url: &Url,
    response: Response,
) -> Result<T, FavoriteError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| FavoriteError::Unavailable(format!("unreadable response: {e}")));
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map_or_else(|_| status.to_string(), |body| body.error);
    if status.is_client_error() {
        Err(FavoriteError::Rejected(message))
    } else {
        Err(FavoriteError::Unavailable(format!(
            "{url} returned {status}: {message}"
        )))
    }
}

#[async_trait]
impl FavoriteApi for HttpFavoriteApi {
    async fn toggle(
        &self,
        request: &ToggleFavoriteRequest,
    ) -> Result<ToggleFavoriteResponse, FavoriteError> {
        self.post("invite/favorite", request).await
    }

    async fn counts(
        &self,
        code: &str,
        photo_ids: &[String],
        visit: &VisitContext,
    ) -> Result<Vec<FavoriteCount>, FavoriteError> {
        let request = FavoriteCountsRequest {
            code: code.to_owned(),
            photo_ids: photo_ids.to_vec(),
            visit_key: visit.visit_key.clone(),
        };
        let response: FavoriteCountsResponse = self.post("invite/favorite-counts", &request).await?;
        Ok(response.counts)
    }
}
