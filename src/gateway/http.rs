// src/gateway/http.rs

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use url::Url;

use crate::{
    config::Config,
    error::GatewayError,
    models::{Resource, VersionTag},
};

use super::Gateway;

/// Gateway speaking JSON over HTTP to the exam API.
///
/// Version tags travel in `If-Match` on requests and `ETag` on responses.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let base_url = Url::parse(&config.api_base_url)?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.base_url.join(path)?)
    }
}

/// Maps a non-success status onto the failure taxonomy.
async fn check(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };

    Err(match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            GatewayError::ValidationFailure(message)
        }
        StatusCode::NOT_FOUND => GatewayError::NotFound(message),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => GatewayError::Conflict(message),
        _ => GatewayError::NetworkFailure(message),
    })
}

/// Decodes a single record, attaching the response's `ETag` if present.
async fn decode_tagged<T: Resource>(response: Response) -> Result<T, GatewayError> {
    let tag = response
        .headers()
        .get(header::ETAG)
        .and_then(|v| v.to_str().ok())
        .map(VersionTag::new);

    let mut record: T = response.json().await?;
    if let Some(tag) = tag {
        record.set_version_tag(tag);
    }
    Ok(record)
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_collection<T: Resource>(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<T>, GatewayError> {
        let url = self.url(&T::collection_path(parent_id))?;
        let response = check(self.client.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn create_entity<T: Resource>(
        &self,
        parent_id: Option<&str>,
        payload: &T::Create,
    ) -> Result<T, GatewayError> {
        let url = self.url(&T::collection_path(parent_id))?;
        let response = check(self.client.post(url).json(payload).send().await?).await?;
        decode_tagged(response).await
    }

    async fn update_entity<T: Resource>(
        &self,
        id: &T::Id,
        payload: &T::Update,
        version_tag: Option<&VersionTag>,
    ) -> Result<T, GatewayError> {
        let url = self.url(&T::member_path(id))?;
        let mut request = self.client.put(url).json(payload);
        if let Some(tag) = version_tag {
            request = request.header(header::IF_MATCH, tag.as_str());
        }
        let response = check(request.send().await?).await?;
        decode_tagged(response).await
    }

    async fn delete_entity<T: Resource>(&self, id: &T::Id) -> Result<(), GatewayError> {
        let url = self.url(&T::member_path(id))?;
        check(self.client.delete(url).send().await?).await?;
        Ok(())
    }
}
