use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::debug;

use eg_core::ports::{ContentSourceError, ContentSourcePort};
use eg_core::{Epigram, EpigramDraft, EpigramId, EpigramPatch};

use super::client::{decode_error, status_error, transport_error, ApiClient, ApiConfig};

/// Content source backed by the backend's `/api/epigrams` routes.
pub struct HttpContentSource {
    api: ApiClient,
}

impl HttpContentSource {
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            api: ApiClient::new(config)?,
        })
    }
}

#[async_trait]
impl ContentSourcePort for HttpContentSource {
    async fn fetch_random_batch(
        &self,
        count: usize,
        exclude: Option<EpigramId>,
    ) -> Result<Vec<Epigram>, ContentSourceError> {
        let mut request = self
            .api
            .request(Method::GET, "/api/epigrams/random/batch")
            .query(&[("count", count.to_string())]);
        if let Some(id) = exclude {
            request = request.query(&[("current_id", id.to_string())]);
        }

        let response = request.send().await.map_err(transport_error)?;
        match response.status() {
            StatusCode::OK => response.json().await.map_err(decode_error),
            // The server answers 404 when it has nothing to offer; an empty
            // batch is a valid outcome for the pipeline, not a failure.
            StatusCode::NOT_FOUND => {
                debug!("content source has no epigrams available");
                Ok(Vec::new())
            }
            status => Err(status_error(status)),
        }
    }

    async fn create(&self, draft: &EpigramDraft) -> Result<Epigram, ContentSourceError> {
        let response = self
            .api
            .request(Method::POST, "/api/epigrams/")
            .json(draft)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK => {
                response.json().await.map_err(decode_error)
            }
            status => Err(status_error(status)),
        }
    }

    async fn update(
        &self,
        id: EpigramId,
        patch: &EpigramPatch,
    ) -> Result<Epigram, ContentSourceError> {
        let response = self
            .api
            .request(Method::PATCH, &format!("/api/epigrams/{}", id))
            .json(patch)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            response.json().await.map_err(decode_error)
        } else {
            Err(status_error(response.status()))
        }
    }

    async fn delete(&self, id: EpigramId) -> Result<(), ContentSourceError> {
        let response = self
            .api
            .request(Method::DELETE, &format!("/api/epigrams/{}", id))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(response.status()))
        }
    }

    async fn list_mine(&self) -> Result<Vec<Epigram>, ContentSourceError> {
        let response = self
            .api
            .request(Method::GET, "/api/epigrams/mine")
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            response.json().await.map_err(decode_error)
        } else {
            Err(status_error(response.status()))
        }
    }
}
