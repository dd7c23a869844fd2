//! Looker REST API client
//!
//! Endpoints used:
//! - `GET {base}/api/{version}/lookml_models`
//! - `GET {base}/api/{version}/lookml_models/{model}/explores/{explore}`

use super::{ApiError, LookerApi};
use crate::config::ApiConfig;
use crate::error::CoreError;
use crate::models::{LookmlExplore, LookmlModel};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

/// Maximum characters of an error body kept in `ApiError::Status`
const ERROR_BODY_MAX_CHARS: usize = 300;

/// reqwest-backed `LookerApi`
#[derive(Debug, Clone)]
pub struct HttpLookerApi {
    client: Client,
    /// `{base_url}/api/{version}/`
    api_root: Url,
}

impl HttpLookerApi {
    /// Build a client from configuration
    ///
    /// The access token, when present, is sent as `Authorization: token <t>`
    /// on every request. Obtaining the token is the caller's business.
    pub fn new(config: &ApiConfig) -> Result<Self, CoreError> {
        if config.base_url.trim().is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "api.base_url is required".to_string(),
            });
        }

        let api_root = Url::parse(&format!("{}/", config.base_url.trim().trim_end_matches('/')))
            .and_then(|base| base.join(&format!("api/{}/", config.api_version)))
            .map_err(|e| CoreError::InvalidConfig {
                message: format!("Invalid api.base_url '{}': {}", config.base_url, e),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.access_token {
            let mut value = HeaderValue::from_str(&format!("token {}", token)).map_err(|_| {
                CoreError::InvalidConfig {
                    message: "api.access_token contains invalid header characters".to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("datadict/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::HttpClient {
                message: e.to_string(),
            })?;

        debug!(api_root = %api_root, "Looker API client ready");

        Ok(Self { client, api_root })
    }

    /// Root URL all endpoints are resolved against
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Resolve an endpoint from path segments, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl {
                message: format!("{} cannot be a base URL", self.api_root),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let url_str = url.to_string();
        trace!(url = %url_str, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                url: url_str.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound { url: url_str });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: url_str,
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_MAX_CHARS).collect(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
            url: url_str.clone(),
            message: e.to_string(),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            url: url_str,
            message: e.to_string(),
        })
    }
}

impl LookerApi for HttpLookerApi {
    async fn list_all_models(&self) -> Result<Vec<LookmlModel>, ApiError> {
        let url = self.endpoint(&["lookml_models"])?;
        self.get_json(url).await
    }

    async fn get_explore(
        &self,
        model_name: &str,
        explore_name: &str,
    ) -> Result<LookmlExplore, ApiError> {
        let url = self.endpoint(&["lookml_models", model_name, "explores", explore_name])?;
        let mut explore: LookmlExplore = self.get_json(url).await?;

        // Some Looker versions omit model_name on the explore payload
        if explore.model_name.is_empty() {
            explore.model_name = model_name.to_string();
        }

        Ok(explore)
    }
}
