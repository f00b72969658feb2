//! HTTP implementation of [`ResourceService`].

use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ServiceConfig;
use crate::error::{GatewayError, Result};
use crate::resource::{Query, ResourceLocator, ResourceService};

/// [`ResourceService`] backed by a reqwest client.
///
/// The client is built once from a validated [`ServiceConfig`] and every
/// request carries the configured credentials as HTTP basic auth. The
/// downstream service is the sole holder of payment state; this client
/// never caches responses.
#[derive(Debug, Clone)]
pub struct HttpResourceService {
    client: Client,
    base_url: Url,
    key: String,
    secret: String,
}

impl HttpResourceService {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if the configuration fails
    /// validation, and [`GatewayError::HttpError`] if the HTTP client
    /// cannot be constructed.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| GatewayError::ConfigError(format!("invalid base_url: {e}")))?;
        // Url::join treats a path without a trailing slash as a file and
        // would drop its last segment.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let client = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            key: config.key.clone(),
            secret: config.secret.clone(),
        })
    }

    fn endpoint(&self, locator: &ResourceLocator) -> Result<Url> {
        self.base_url
            .join(&locator.url_path())
            .map_err(|e| GatewayError::ConfigError(format!("cannot address {locator}: {e}")))
    }

    #[instrument(skip(self, query, payload), fields(target = %locator))]
    async fn execute(
        &self,
        method: Method,
        locator: &ResourceLocator,
        query: &Query,
        payload: Option<&Value>,
    ) -> Result<Value> {
        let url = self.endpoint(locator)?;
        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&self.key, Some(&self.secret));
        if !query.is_empty() {
            request = request.query(query.pairs());
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await?;
        self.classify(locator, response).await
    }

    async fn classify(&self, locator: &ResourceLocator, response: Response) -> Result<Value> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(target = %locator, "downstream returned 404");
            return Err(GatewayError::NotFound(locator.to_string()));
        }
        if status.is_client_error() {
            let body = response.json().await.unwrap_or(Value::Null);
            warn!(target = %locator, status = status.as_u16(), "downstream rejected request");
            return Err(GatewayError::ClientError { status: status.as_u16(), body });
        }
        if status.is_server_error() {
            warn!(target = %locator, status = status.as_u16(), "downstream failure");
            return Err(GatewayError::ServerError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            GatewayError::MalformedRecord(format!("unparseable response from {locator}: {e}"))
        })
    }
}

impl ResourceService for HttpResourceService {
    async fn get(&self, locator: &ResourceLocator, query: &Query) -> Result<Value> {
        self.execute(Method::GET, locator, query, None).await
    }

    async fn post(&self, locator: &ResourceLocator, payload: &Value) -> Result<Value> {
        self.execute(Method::POST, locator, &Query::new(), Some(payload)).await
    }

    async fn patch(&self, locator: &ResourceLocator, payload: &Value) -> Result<Value> {
        self.execute(Method::PATCH, locator, &Query::new(), Some(payload)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServiceConfig {
        ServiceConfig::new("https://resources.internal/api", "front-door", "s3cret")
    }

    #[test]
    fn test_new_validates_config() {
        let mut bad = config();
        bad.key = String::new();
        assert!(matches!(
            HttpResourceService::new(&bad).unwrap_err(),
            GatewayError::ConfigError(_)
        ));
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let service = HttpResourceService::new(&config()).unwrap();
        let locator = ResourceLocator::from_dotted("generic.transaction").with_id("42");
        assert_eq!(
            service.endpoint(&locator).unwrap().as_str(),
            "https://resources.internal/api/generic/transaction/42/"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_without_trailing_slash() {
        // The config's base_url deliberately lacks the trailing slash.
        let service = HttpResourceService::new(&config()).unwrap();
        let locator = ResourceLocator::from_dotted("generic.buyer");
        assert_eq!(
            service.endpoint(&locator).unwrap().as_str(),
            "https://resources.internal/api/generic/buyer/"
        );
    }
}
