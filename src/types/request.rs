//! Request descriptors.
//!
//! An [`ApiRequest`] describes one marketplace operation without performing any I/O. It is
//! handed to [`crate::client::Client::execute`], which signs and dispatches it.

#![allow(
    clippy::module_name_repetitions,
    reason = "Request suffix is intentional for clarity"
)]

use std::collections::BTreeMap;
use std::fmt;

use bon::Builder;
use reqwest::Method;
use serde::Serialize;

use super::Language;
use crate::error::Error;
use crate::{MAGIC_THE_GATHERING, Result};

/// Query parameters of a request. Keys are kept in ascending order, which is the order they are
/// written to the query string.
pub type Params = BTreeMap<String, ParamValue>;

/// A scalar query parameter value.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl ParamValue {
    /// Returns the value as an integer, if it is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(value) => Some(*value),
            ParamValue::Text(value) => value.parse().ok(),
            ParamValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(value) => write!(f, "{value}"),
            ParamValue::Integer(value) => write!(f, "{value}"),
            ParamValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<Language> for ParamValue {
    fn from(value: Language) -> Self {
        ParamValue::Integer(i64::from(value.id()))
    }
}

/// Description of a single API operation.
///
/// # Example
///
/// ```
/// use cardmarket_client_sdk::types::request::ApiRequest;
///
/// let request = ApiRequest::builder()
///     .path("/products/265535")
///     .expected_key("product")
///     .build();
///
/// assert_eq!(request.method, reqwest::Method::GET);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ApiRequest {
    /// Path below `{host}/output.json`, starting with `/`.
    #[builder(into)]
    pub path: String,
    #[builder(default)]
    pub params: Params,
    #[builder(default = Method::GET)]
    pub method: Method,
    /// Top-level JSON field holding the payload. When absent, the whole document is returned.
    #[builder(into)]
    pub expected_key: Option<String>,
    /// XML request body, mandatory for POST and PUT.
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Fails unless the method is GET or DELETE, or POST/PUT with a non-empty body.
    pub fn validate(&self) -> Result<()> {
        let has_body = self.body.as_ref().is_some_and(|body| !body.is_empty());

        match self.method {
            Method::GET | Method::DELETE => Ok(()),
            Method::POST | Method::PUT if has_body => Ok(()),
            _ => Err(Error::unsupported_request(
                self.method.clone(),
                self.path.clone(),
            )),
        }
    }
}

/// Request parameters for the `/products/find` endpoint.
///
/// # Example
///
/// ```
/// use cardmarket_client_sdk::types::Language;
/// use cardmarket_client_sdk::types::request::FindProductsRequest;
///
/// let request = FindProductsRequest::builder()
///     .search("Giant Spider")
///     .exact(true)
///     .language(Language::French)
///     .build();
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct FindProductsRequest {
    /// Product name to search for.
    #[builder(into)]
    pub search: String,
    /// Whether `search` must match the name exactly (default: false).
    #[builder(default)]
    pub exact: bool,
    /// Language the name is written in (default: English).
    #[builder(default)]
    pub language: Language,
    /// Game to search in (default: Magic: The Gathering).
    #[builder(default = MAGIC_THE_GATHERING)]
    pub game: u32,
}

impl FindProductsRequest {
    #[must_use]
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert("search".to_owned(), self.search.as_str().into());
        params.insert("exact".to_owned(), self.exact.into());
        params.insert("idGame".to_owned(), i64::from(self.game).into());
        params.insert("idLanguage".to_owned(), self.language.into());
        params
    }
}

/// An article and the amount of it to put in, or take out of, the shopping cart.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct CartItem {
    pub article_id: u64,
    #[builder(default = 1)]
    pub amount: u32,
}
