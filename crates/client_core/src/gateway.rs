//! Request layer over the remote product collection.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use shared::{
    domain::ProductId,
    error::GatewayError,
    protocol::{Product, ProductInput},
};
use tracing::{debug, warn};

use crate::config::{normalize_api_base_url, Settings};

#[async_trait]
pub trait ProductGateway: Send + Sync {
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Product>, GatewayError>;
    async fn get_by_id(&self, id: ProductId) -> Result<Product, GatewayError>;
    async fn create(&self, input: &ProductInput) -> Result<Product, GatewayError>;
    async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, GatewayError>;
    async fn delete(&self, id: ProductId) -> Result<(), GatewayError>;
}

#[derive(Serialize)]
struct ListProductsQuery {
    offset: usize,
    limit: usize,
}

pub struct HttpProductGateway {
    http: Client,
    base_url: String,
}

impl HttpProductGateway {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = normalize_api_base_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base_url })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            &settings.api_base_url,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn product_url(&self, id: ProductId) -> String {
        format!("{}/products/{}", self.base_url, id.0)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        lookup: Option<ProductId>,
    ) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if let Some(id) = lookup {
            if is_missing_entity(status, &body) {
                return Err(GatewayError::NotFound(id));
            }
        }
        warn!(status = status.as_u16(), "gateway: request rejected");
        Err(GatewayError::server(status.as_u16(), body))
    }
}

fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::InvalidResponse(err.to_string())
    } else {
        warn!("gateway: transport failure: {err}");
        GatewayError::Network(err.to_string())
    }
}

/// The remote answers unknown ids with either a 404 or a 400 whose body says
/// it could not find the entity.
fn is_missing_entity(status: StatusCode, body: &str) -> bool {
    status == StatusCode::NOT_FOUND
        || (status == StatusCode::BAD_REQUEST
            && body.to_ascii_lowercase().contains("could not find"))
}

#[async_trait]
impl ProductGateway for HttpProductGateway {
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Product>, GatewayError> {
        debug!(limit, offset, "gateway: list products");
        let request = self
            .http
            .get(format!("{}/products", self.base_url))
            .query(&ListProductsQuery { offset, limit });
        self.send(request, None)
            .await?
            .json()
            .await
            .map_err(map_transport_error)
    }

    async fn get_by_id(&self, id: ProductId) -> Result<Product, GatewayError> {
        debug!(product_id = id.0, "gateway: get product");
        let request = self.http.get(self.product_url(id));
        self.send(request, Some(id))
            .await?
            .json()
            .await
            .map_err(map_transport_error)
    }

    async fn create(&self, input: &ProductInput) -> Result<Product, GatewayError> {
        debug!(title = %input.title, "gateway: create product");
        let request = self
            .http
            .post(format!("{}/products/", self.base_url))
            .json(input);
        self.send(request, None)
            .await?
            .json()
            .await
            .map_err(map_transport_error)
    }

    async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, GatewayError> {
        debug!(product_id = id.0, "gateway: update product");
        let request = self.http.put(self.product_url(id)).json(input);
        self.send(request, None)
            .await?
            .json()
            .await
            .map_err(map_transport_error)
    }

    async fn delete(&self, id: ProductId) -> Result<(), GatewayError> {
        debug!(product_id = id.0, "gateway: delete product");
        let request = self.http.delete(self.product_url(id));
        self.send(request, None).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
