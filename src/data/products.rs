//! Product backend API client
//!
//! Fetches pricing and product data from the backend's REST API and maps
//! status codes to typed results. Only an unauthorized deal validation lookup
//! is surfaced as an error; other non-success statuses become an absent result.

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::{
    BestPriceGuaranteeInfo, DealValidationInfo, ProductSkuWithSubcat,
    ProductWithMinimumPriceCompetitor,
};
use crate::cache::CacheManager;
use crate::config::BackendConfig;

/// Message carried by `BackendError::Unauthorized`
pub const INSUFFICIENT_PERMISSION: &str = "Access token with insufficient permission";

/// Errors that can occur when querying the backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend rejected the caller's credentials
    #[error("{}", INSUFFICIENT_PERMISSION)]
    Unauthorized,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request path could not be resolved against the base URL
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl BackendError {
    /// Whether this error should be reported to the end user as a permission problem
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Unauthorized)
    }
}

type DealCacheKey = (u64, Option<String>);

#[derive(Serialize)]
struct SkuSearch<'a> {
    skus: &'a [String],
}

/// Client for the product backend
///
/// Cheap to clone; clones share the deal validation cache.
#[derive(Debug, Clone)]
pub struct BackendClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Backend location and credentials
    config: Arc<BackendConfig>,
    /// Memoized deal validation lookups
    deal_cache: Arc<CacheManager<DealCacheKey, Option<DealValidationInfo>>>,
}

impl BackendClient {
    /// Creates a client with a default HTTP transport
    pub fn new(config: BackendConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Creates a client on top of an existing HTTP transport
    pub fn with_client(config: BackendConfig, http_client: Client) -> Self {
        let deal_cache = CacheManager::new(config.deal_cache_capacity, config.deal_cache_ttl);
        Self {
            http_client,
            config: Arc::new(config),
            deal_cache: Arc::new(deal_cache),
        }
    }

    /// The settings this client was built with
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Fetch best price guarantee terms for a product
    ///
    /// # Arguments
    /// * `product_id` - Backend product identifier
    /// * `token` - Caller's authorization token, forwarded when present
    ///
    /// # Returns
    /// * `Ok(Some(info))` on HTTP 200
    /// * `Ok(None)` on any other status, after logging a warning
    /// * `Err(BackendError)` if the request or decoding fails
    pub async fn fetch_best_price_guarantee_info(
        &self,
        product_id: u64,
        token: Option<&str>,
    ) -> Result<Option<BestPriceGuaranteeInfo>, BackendError> {
        let url = self.endpoint(&format!(
            "api/products/{}/best_price_guarantee_info",
            product_id
        ))?;
        debug!(%url, product_id, "fetching best price guarantee info");

        let response = with_token(self.http_client.get(url), token).send().await?;

        match response.status() {
            StatusCode::OK => Ok(Some(decode(response).await?)),
            status => {
                warn!(
                    product_id,
                    %status,
                    "Error calling backend for best price guarantee of product ID: {}",
                    product_id
                );
                Ok(None)
            }
        }
    }

    /// Fetch deal validation info for a product, memoized per `(product_id, user_email)`
    ///
    /// When `user_email` is given the request authenticates with the shared
    /// secret and passes the email as a query parameter; the caller's token is
    /// not sent. Otherwise the token is forwarded when present.
    ///
    /// Absent results are cached like present ones. Errors are never cached.
    ///
    /// # Returns
    /// * `Ok(Some(info))` on HTTP 200 with a non-empty body
    /// * `Ok(None)` on HTTP 200 with an empty body, or any status other than 401
    /// * `Err(BackendError::Unauthorized)` on HTTP 401
    /// * `Err(BackendError)` if the request or decoding fails
    pub async fn fetch_deal_validation_info(
        &self,
        product_id: u64,
        user_email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<DealValidationInfo>, BackendError> {
        let user_email = user_email.filter(|email| !email.is_empty());
        let key = (product_id, user_email.map(str::to_string));

        if let Some(cached) = self.deal_cache.get(&key) {
            debug!(product_id, "deal validation info served from cache");
            return Ok(cached);
        }

        let info = self
            .request_deal_validation_info(product_id, user_email, token)
            .await?;
        self.deal_cache.insert(key, info.clone());
        Ok(info)
    }

    async fn request_deal_validation_info(
        &self,
        product_id: u64,
        user_email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<DealValidationInfo>, BackendError> {
        let url = self.endpoint(&format!("api/products/{}/deal_validation_info", product_id))?;
        debug!(%url, product_id, elevated = user_email.is_some(), "fetching deal validation info");

        let request = match user_email {
            Some(email) => self
                .http_client
                .get(url)
                .header(
                    self.config.shared_secret_header.clone(),
                    self.config.shared_secret.expose_secret(),
                )
                .query(&[("user_email", email)]),
            None => with_token(self.http_client.get(url), token),
        };
        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await?;
                if body.is_empty() {
                    return Ok(None);
                }
                let value: Value = serde_json::from_slice(&body)?;
                if is_falsy(&value) {
                    return Ok(None);
                }
                Ok(Some(serde_json::from_value(value)?))
            }
            StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
            status => {
                warn!(
                    product_id,
                    %status,
                    "Error calling backend for deal validation info of product ID: {}",
                    product_id
                );
                Ok(None)
            }
        }
    }

    /// Fetch a product and its cheapest competitor by SKU
    ///
    /// The SKU is placed in the path as given; it should already be a safe
    /// path segment.
    ///
    /// # Returns
    /// * `Ok(Some(product))` on HTTP 200
    /// * `Ok(None)` on HTTP 400 (unknown SKU), silently
    /// * `Ok(None)` on any other status, after logging a warning
    pub async fn fetch_product_by_sku(
        &self,
        sku: &str,
        token: Option<&str>,
    ) -> Result<Option<ProductWithMinimumPriceCompetitor>, BackendError> {
        let url = self.endpoint(&format!("api/products/sku/{}", sku))?;
        debug!(%url, sku, "fetching product by SKU");

        let response = with_token(self.http_client.get(url), token).send().await?;

        match response.status() {
            StatusCode::OK => Ok(Some(decode(response).await?)),
            StatusCode::BAD_REQUEST => Ok(None),
            status => {
                warn!(sku, %status, "Error calling backend for product of SKU: {}", sku);
                Ok(None)
            }
        }
    }

    /// Fetch a product and its cheapest competitor by backend ID
    ///
    /// # Returns
    /// * `Ok(Some(product))` on HTTP 200
    /// * `Ok(None)` on HTTP 400, silently
    /// * `Ok(None)` on any other status, after logging a warning
    pub async fn fetch_product_by_id(
        &self,
        product_id: u64,
        token: Option<&str>,
    ) -> Result<Option<ProductWithMinimumPriceCompetitor>, BackendError> {
        let url = self.endpoint(&format!("api/products/{}", product_id))?;
        debug!(%url, product_id, "fetching product by ID");

        let response = with_token(self.http_client.get(url), token).send().await?;

        match response.status() {
            StatusCode::OK => Ok(Some(decode(response).await?)),
            StatusCode::BAD_REQUEST => Ok(None),
            status => {
                warn!(
                    product_id,
                    %status,
                    "Error calling backend for product of ID: {}",
                    product_id
                );
                Ok(None)
            }
        }
    }

    /// Look up the subcategory of each SKU in one request
    ///
    /// Always authenticates with the service API key. An empty `skus` slice
    /// is still sent to the backend.
    ///
    /// # Returns
    /// * `Ok(items)` decoded from the response on HTTP 200
    /// * `Ok(vec![])` on HTTP 400, silently
    /// * `Ok(vec![])` on any other status, after logging a warning
    pub async fn fetch_subcategories_for_skus(
        &self,
        skus: &[String],
    ) -> Result<Vec<ProductSkuWithSubcat>, BackendError> {
        let url = self.endpoint("api/products/search")?;
        debug!(%url, count = skus.len(), "searching subcategories for SKUs");

        let response = self
            .http_client
            .post(url)
            .header(AUTHORIZATION, self.config.service_api_key.expose_secret())
            .json(&SkuSearch { skus })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(decode(response).await?),
            StatusCode::BAD_REQUEST => Ok(Vec::new()),
            status => {
                warn!(
                    %status,
                    "Error calling backend for products of SKUs: {:?}",
                    response
                );
                Ok(Vec::new())
            }
        }
    }

    /// Resolves a relative API path against the configured base URL
    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.config.base_url.join(path)?)
    }
}

/// Forwards the caller's token as the `authorization` header, if there is one
fn with_token(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token.filter(|token| !token.is_empty()) {
        Some(token) => request.header(AUTHORIZATION, token),
        None => request,
    }
}

/// Reads the whole body and decodes it as JSON
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Whether a decoded body carries no information
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
