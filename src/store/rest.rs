//! Card key store reached over a PostgREST-style HTTP API.
//!
//! # Requests
//!
//! - Lookup: `GET {base}/rest/v1/card_keys?select=*&key=eq.<key>`
//! - Clock: `POST {base}/rest/v1/rpc/get_server_time`
//!
//! Both send the access key as `apikey` and as a bearer token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use url::Url;

use super::{CardKeyStore, StoreError};
use crate::models::card_key::{CardKeyRecord, LookupOutcome, parse_timestamp};

const TABLE_PATH: &str = "rest/v1/card_keys";
const SERVER_TIME_PATH: &str = "rest/v1/rpc/get_server_time";

#[derive(Clone)]
struct Endpoint {
    base: Url,
    api_key: String,
}

/// Card key store backed by the REST API of a hosted Postgres.
#[derive(Clone)]
pub struct RestCardKeyStore {
    client: Client,
    endpoint: Option<Endpoint>,
}

impl RestCardKeyStore {
    /// Build the store.
    ///
    /// A missing URL or key is accepted: the store then fails every lookup
    /// and every clock query.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is present but malformed, or if the HTTP
    /// client cannot be built.
    pub fn new(base_url: Option<&str>, api_key: Option<&str>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("card-key-validator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let endpoint = match (base_url, api_key) {
            (Some(base_url), Some(api_key)) => Some(Endpoint {
                base: normalize_base(base_url)?,
                api_key: api_key.to_string(),
            }),
            _ => None,
        };

        Ok(Self { client, endpoint })
    }

    fn endpoint(&self) -> Result<&Endpoint, StoreError> {
        self.endpoint
            .as_ref()
            .ok_or(StoreError::NotConfigured("STORE_URL and STORE_KEY must both be set"))
    }

    async fn fetch_rows(&self, key: &str) -> Result<Vec<CardKeyRecord>, StoreError> {
        let endpoint = self.endpoint()?;

        let mut url = endpoint.base.join(TABLE_PATH)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("key", &format!("eq.{key}"));

        let response = self
            .client
            .get(url)
            .header("apikey", &endpoint.api_key)
            .bearer_auth(&endpoint.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let response = ensure_success(response).await?;
        Ok(response.json::<Vec<CardKeyRecord>>().await?)
    }
}

#[async_trait]
impl CardKeyStore for RestCardKeyStore {
    async fn find_by_key(&self, key: &str) -> LookupOutcome {
        match self.fetch_rows(key).await {
            Ok(rows) => LookupOutcome::from_rows(rows),
            Err(e) => LookupOutcome::QueryError(e.to_string()),
        }
    }

    async fn server_time(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let endpoint = self.endpoint()?;
        let url = endpoint.base.join(SERVER_TIME_PATH)?;

        let response = self
            .client
            .post(url)
            .header("apikey", &endpoint.api_key)
            .bearer_auth(&endpoint.api_key)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let value = ensure_success(response)
            .await?
            .json::<serde_json::Value>()
            .await?;

        // An unreadable clock value is treated like no answer at all
        Ok(value.as_str().and_then(parse_timestamp))
    }
}

/// Make sure relative joins land under the configured base path.
fn normalize_base(raw: &str) -> Result<Url, StoreError> {
    let mut base = Url::parse(raw.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}
