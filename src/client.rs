//! Client for the Cardmarket API.
//!
//! # Example
//!
//! ```no_run
//! use cardmarket_client_sdk::auth::Credentials;
//! use cardmarket_client_sdk::types::request::FindProductsRequest;
//! use cardmarket_client_sdk::{Client, Config, PRODUCTION_URL};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::new(
//!     "app-token".to_owned(),
//!     "app-secret".to_owned(),
//!     "access-token".to_owned(),
//!     "access-token-secret".to_owned(),
//! );
//! let client = Client::new(PRODUCTION_URL, credentials, Config::default())?;
//!
//! let request = FindProductsRequest::builder().search("Giant Spider").build();
//! let response = client.find_products(&request).await?;
//!
//! for product in &response.data {
//!     println!("{}: {}", product.id_product, product.en_name);
//! }
//! println!("{} requests used", response.rate_limit.request_count);
//! # Ok(())
//! # }
//! ```

use std::io::Read as _;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bon::Builder;
use chrono::Utc;
use flate2::read::GzDecoder;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::auth::{self, Credentials};
use crate::endpoints;
use crate::types::CartAction;
use crate::types::request::{ApiRequest, CartItem, FindProductsRequest, ParamValue, Params};
use crate::types::response::{
    Article, Expansion, Metaproduct, Product, RateLimit, Response, Want, Wantslist,
};
use crate::{MAGIC_THE_GATHERING, OUTPUT_FORMAT, PAGE_SIZE, Result, ToQueryParams as _};

const DEFAULT_USER_AGENT: &str = "cardmarket_client";

pub(crate) const START: &str = "start";
pub(crate) const MAX_RESULTS: &str = "maxResults";

/// Configuration for [`Client`]
#[derive(Clone, Debug, Default, Builder)]
pub struct Config {
    /// Timeout applied to each HTTP call. No timeout by default.
    timeout: Option<Duration>,
    /// `User-Agent` header sent with every request. Defaults to `cardmarket_client`.
    #[builder(into)]
    user_agent: Option<String>,
}

#[derive(Debug)]
struct ClientInner {
    /// Host without trailing `/`, e.g. `https://api.cardmarket.com/ws/v2.0`.
    host: String,
    credentials: Credentials,
    client: ReqwestClient,
    /// Rate limit of the most recent HTTP response made through this client.
    rate_limit: Mutex<RateLimit>,
}

/// The main way for API users to interact with Cardmarket.
///
/// Every operation returns its data together with the [`RateLimit`] reported by the last HTTP
/// response it took. The client also remembers the last observed rate limit, see
/// [`Client::rate_limit`].
///
/// [`Client`] is cheap to clone and thread-safe.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a client signing its requests with `credentials`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host URL is invalid or the HTTP client cannot be initialized.
    pub fn new(host: &str, credentials: Credentials, config: Config) -> Result<Client> {
        let host = Url::parse(host)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // 307 is how the API asks for pagination, so redirects must reach `execute`.
        let mut builder = ReqwestClient::builder()
            .default_headers(headers)
            .redirect(Policy::none());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ClientInner {
                host: host.as_str().trim_end_matches('/').to_owned(),
                credentials,
                client: builder.build()?,
                rate_limit: Mutex::new(RateLimit::default()),
            }),
        })
    }

    /// Returns the host requests are made against.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// Returns the rate limit of the most recent HTTP response made through this client, by any
    /// caller. Prefer [`Response::rate_limit`] when the client is shared.
    #[must_use]
    pub fn rate_limit(&self) -> RateLimit {
        *self
            .inner
            .rate_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, rate_limit: RateLimit) {
        *self
            .inner
            .rate_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = rate_limit;
    }

    /// Signs and dispatches `request`, following the API's pagination signals.
    ///
    /// - `200`: the value under the expected key is returned (`null` if missing).
    /// - `206`: a page. Pages of [`PAGE_SIZE`] entries are followed by a request with `start`
    ///   advanced by [`PAGE_SIZE`]; all pages are concatenated.
    /// - `307`: too many results. The request is sent again with `start=0` and
    ///   `maxResults=1000` merged over its parameters.
    /// - anything else: no data, i.e. an empty list when nothing was collected before.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::Kind::Validation`] error, without any network call, unless the
    /// method is GET or DELETE or a POST/PUT with a non-empty body. Transport failures and
    /// undecodable JSON bodies are errors too.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "debug",
            skip(self, request),
            fields(method = %request.method, path = %request.path)
        )
    )]
    pub async fn execute(&self, request: &ApiRequest) -> Result<Response<Value>> {
        if let Err(e) = request.validate() {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "refusing to dispatch request");
            return Err(e);
        }

        let mut params = request.params.clone();
        let mut pages: Vec<Value> = Vec::new();
        let mut paginated = false;

        loop {
            let response = self.send(request, &params).await?;
            let status = response.status();
            let rate_limit = RateLimit::from_headers(response.headers());
            self.record(rate_limit);

            match status {
                StatusCode::OK | StatusCode::PARTIAL_CONTENT => {
                    let document: Value = serde_json::from_slice(&response.bytes().await?)?;
                    let page = extract(document, request.expected_key.as_deref());
                    let is_full = status == StatusCode::PARTIAL_CONTENT
                        && page
                            .as_array()
                            .is_some_and(|items| items.len() == usize::from(PAGE_SIZE));
                    pages.push(page);

                    if !is_full {
                        return Ok(Response::new(concat(pages), rate_limit));
                    }

                    let start = params
                        .get(START)
                        .and_then(ParamValue::as_integer)
                        .unwrap_or(0);
                    params.insert(
                        START.to_owned(),
                        ParamValue::from(start + i64::from(PAGE_SIZE)),
                    );
                }
                StatusCode::TEMPORARY_REDIRECT if !paginated => {
                    paginated = true;
                    params.insert(START.to_owned(), ParamValue::from(0));
                    params.insert(
                        MAX_RESULTS.to_owned(),
                        ParamValue::from(i64::from(PAGE_SIZE)),
                    );
                }
                _ => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        status = %status,
                        path = %request.path,
                        "unexpected status, returning no data"
                    );
                    return Ok(Response::new(concat(pages), rate_limit));
                }
            }
        }
    }

    async fn send(&self, request: &ApiRequest, params: &Params) -> Result<reqwest::Response> {
        let realm = format!("{}{OUTPUT_FORMAT}{}", self.inner.host, request.path);
        let url = format!("{realm}{}", params.query_params()?);

        let authorization = auth::authorization(
            &self.inner.credentials,
            &request.method,
            &realm,
            params,
            Utc::now().timestamp(),
            &Uuid::new_v4().simple().to_string(),
        )?;

        let mut builder = self
            .inner
            .client
            .request(request.method.clone(), &url)
            .header(AUTHORIZATION, authorization);
        // GET and DELETE never carry a body.
        if let Some(body) = request
            .body
            .as_ref()
            .filter(|_| matches!(request.method, Method::POST | Method::PUT))
        {
            builder = builder
                .header(CONTENT_TYPE, "application/xml")
                .body(body.clone());
        }

        let response = self.inner.client.execute(builder.build()?).await?;

        #[cfg(feature = "tracing")]
        tracing::info!(status = response.status().as_u16(), url = %url, "Cardmarket API request");

        Ok(response)
    }

    /// Returns the metaproduct, i.e. the card across all of its printings.
    pub async fn metaproduct(&self, metaproduct_id: u64) -> Result<Response<Option<Metaproduct>>> {
        self.execute(&endpoints::metaproduct(metaproduct_id))
            .await?
            .decode()
    }

    pub async fn product(&self, product_id: u64) -> Result<Response<Option<Product>>> {
        self.execute(&endpoints::product(product_id)).await?.decode()
    }

    /// Searches products of a game by name, either exactly or as a fuzzy match.
    pub async fn find_products(
        &self,
        request: &FindProductsRequest,
    ) -> Result<Response<Vec<Product>>> {
        self.execute(&endpoints::find_products(request))
            .await?
            .decode_list()
    }

    /// Returns every article for sale for a product, across as many pages as needed.
    pub async fn articles(&self, product_id: u64) -> Result<Response<Vec<Article>>> {
        self.execute(&endpoints::articles(product_id))
            .await?
            .decode_list()
    }

    /// Returns the product catalog exactly as sent: base64 of a gzipped CSV file.
    pub async fn product_list_file(&self) -> Result<Response<Option<String>>> {
        self.execute(&endpoints::product_list()).await?.decode()
    }

    /// Returns the decompressed product catalog, ready to be written to a file.
    pub async fn product_list(&self) -> Result<Response<Vec<u8>>> {
        let response = self.product_list_file().await?;
        let data = match &response.data {
            Some(encoded) => decompress_catalog(encoded)?,
            None => Vec::new(),
        };

        Ok(Response::new(data, response.rate_limit))
    }

    /// Returns every expansion of Magic: The Gathering.
    pub async fn expansions(&self) -> Result<Response<Vec<Expansion>>> {
        self.execute(&endpoints::expansions(MAGIC_THE_GATHERING))
            .await?
            .decode_list()
    }

    pub async fn wantslists(&self) -> Result<Response<Vec<Wantslist>>> {
        self.execute(&endpoints::wantslists())
            .await?
            .decode_list()
    }

    /// Returns the entries of one want-list.
    pub async fn wants(&self, wantslist_id: u64) -> Result<Response<Vec<Want>>> {
        self.execute(&endpoints::wants(wantslist_id))
            .await?
            .decode_list()
    }

    /// Creates a Magic: The Gathering want-list and returns the account's want-lists.
    pub async fn create_wantslist(&self, name: &str) -> Result<Response<Vec<Wantslist>>> {
        self.execute(&endpoints::create_wantslist(name, MAGIC_THE_GATHERING)?)
            .await?
            .decode_list()
    }

    pub async fn delete_wantslist(&self, wantslist_id: u64) -> Result<Response<Value>> {
        self.execute(&endpoints::delete_wantslist(wantslist_id))
            .await
    }

    /// Returns the shopping cart document: `shoppingCart`, `shippingAddress` and `account`.
    pub async fn shopping_cart(&self) -> Result<Response<Value>> {
        self.execute(&endpoints::shopping_cart()).await
    }

    pub async fn add_to_cart(&self, items: &[CartItem]) -> Result<Response<Value>> {
        self.execute(&endpoints::change_cart(CartAction::Add, items)?)
            .await
    }

    pub async fn remove_from_cart(&self, items: &[CartItem]) -> Result<Response<Value>> {
        self.execute(&endpoints::change_cart(CartAction::Remove, items)?)
            .await
    }

    pub async fn empty_cart(&self) -> Result<Response<Value>> {
        self.execute(&endpoints::empty_cart()).await
    }
}

fn extract(mut document: Value, expected_key: Option<&str>) -> Value {
    match expected_key {
        Some(key) => document.get_mut(key).map(Value::take).unwrap_or_default(),
        None => document,
    }
}

/// A single page is returned unchanged, several are flattened into one list.
fn concat(mut pages: Vec<Value>) -> Value {
    if pages.len() <= 1 {
        return pages.pop().unwrap_or_else(|| Value::Array(Vec::new()));
    }

    let mut items = Vec::new();
    for page in pages {
        match page {
            Value::Array(page) => items.extend(page),
            Value::Null => {}
            other => items.push(other),
        }
    }

    Value::Array(items)
}

fn decompress_catalog(encoded: &str) -> Result<Vec<u8>> {
    let compressed = STANDARD.decode(encoded.trim())?;
    let mut catalog = Vec::new();
    GzDecoder::new(compressed.as_slice()).read_to_end(&mut catalog)?;

    Ok(catalog)
}
