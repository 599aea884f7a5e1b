//! A client for the currency exchange rate provider.

use std::collections::HashMap;

use serde::Deserialize;

use crate::Error;

/// The name used for the exchange rate provider in errors and logs.
pub(crate) const PROVIDER: &str = "Currency";

const DEFAULT_BASE_URL: &str = "http://api.currencylayer.com";

/// Fetches live exchange rates.
#[derive(Clone)]
pub struct ExchangeRateClient {
    http: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl std::fmt::Debug for ExchangeRateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeRateClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct LiveResponse {
    success: bool,
    #[serde(default)]
    quotes: HashMap<String, f64>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    info: String,
}

impl ExchangeRateClient {
    /// Create a client for the public provider API.
    pub fn new(access_key: &str) -> Self {
        Self::with_base_url(access_key, DEFAULT_BASE_URL)
    }

    /// Create a client that sends requests to `base_url` instead of the public API.
    pub fn with_base_url(access_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            access_key: access_key.to_owned(),
        }
    }

    /// Get the number of units of `target` that one unit of `base` buys.
    ///
    /// Both currencies must be upper case ISO 4217 codes.
    ///
    /// # Errors
    /// Returns [Error::Upstream] if the request fails, the provider reports
    /// an error, or the response does not include the requested rate.
    pub async fn live_rate(&self, base: &str, target: &str) -> Result<f64, Error> {
        let response = self
            .http
            .get(format!("{}/live", self.base_url))
            .query(&[
                ("access_key", self.access_key.as_str()),
                ("currencies", target),
                ("source", base),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| Error::Upstream(PROVIDER, error.to_string()))?;

        let body: LiveResponse = response
            .json()
            .await
            .map_err(|error| Error::Upstream(PROVIDER, error.to_string()))?;

        if !body.success {
            let reason = body
                .error
                .map(|error| error.info)
                .unwrap_or_else(|| "request was not successful".to_owned());
            return Err(Error::Upstream(PROVIDER, reason));
        }

        let quote = format!("{base}{target}");
        body.quotes
            .get(&quote)
            .copied()
            .ok_or_else(|| Error::Upstream(PROVIDER, format!("response has no {quote} quote")))
    }
}
