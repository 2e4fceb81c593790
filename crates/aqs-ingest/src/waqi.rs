//! WAQI (World Air Quality Index) `map/bounds` client
//!
//! API documentation: https://aqicn.org/json-api/doc/#api-Map_Queries-GetMapStations

use crate::{Fetcher, IngestError, IngestResult};
use aqs_core::{BoundingBox, RawResponse};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const WAQI_BASE_URL: &str = "https://api.waqi.info";

const BOUNDS_PATH: &str = "v2/map/bounds";

pub struct WaqiClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl WaqiClient {
    /// Create a client against the public WAQI endpoint
    pub fn new(token: String, timeout: Duration) -> IngestResult<Self> {
        Self::with_base_url(WAQI_BASE_URL, token, timeout)
    }

    /// Create a client against another endpoint (mirrors, local test servers)
    pub fn with_base_url(base_url: &str, token: String, timeout: Duration) -> IngestResult<Self> {
        if token.is_empty() {
            return Err(IngestError::Fetcher("empty API token".into()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            token,
        })
    }

    /// Build the bounds query.
    ///
    /// The query string is written by hand: WAQI expects the `latlng` commas
    /// unescaped.
    pub fn bounds_url(&self, bbox: &BoundingBox) -> IngestResult<Url> {
        let mut url = self.base_url.join(BOUNDS_PATH)?;
        url.set_query(Some(&format!(
            "latlng={}&networks=all&token={}",
            bbox, self.token
        )));
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Fetcher for WaqiClient {
    fn name(&self) -> &str {
        "waqi"
    }

    #[instrument(skip_all, fields(bbox = %bbox))]
    async fn fetch(&self, bbox: &BoundingBox) -> IngestResult<RawResponse> {
        let url = self.bounds_url(bbox)?;
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        // WAQI reports quota/key problems inside the payload; only give up on
        // the status code if the body is not a payload at all
        let status = resp.status();
        let body = resp.bytes().await?;
        let payload: RawResponse =
            serde_json::from_slice(&body).map_err(|e| IngestError::Decode {
                status: status.as_u16(),
                message: e.to_string(),
            })?;

        debug!(http_status = status.as_u16(), status = %payload.status, "WAQI response");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_url() {
        let client = WaqiClient::new("demo".into(), Duration::from_secs(5)).unwrap();
        let bbox = BoundingBox::new(49.135713, -122.892371, 50.271092, -123.612322);
        assert_eq!(
            client.bounds_url(&bbox).unwrap().as_str(),
            "https://api.waqi.info/v2/map/bounds?latlng=49.135713,-122.892371,50.271092,-123.612322&networks=all&token=demo"
        );
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(WaqiClient::new(String::new(), Duration::from_secs(5)).is_err());
    }
}
