#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests, and https://github.com/rust-lang/rust-clippy/issues/13981"
)]
#![allow(
    unused,
    reason = "Not every test binary uses every helper"
)]

use cardmarket_client_sdk::auth::Credentials;
use cardmarket_client_sdk::{Client, Config};
use httpmock::MockServer;
use serde_json::{Value, json};

// example tokens from the public API documentation
pub const APP_TOKEN: &str = "bfaD9xOU0SXBhtBP";
pub const APP_SECRET: &str = "pChvrpp6AEOEwxBIIUBOvWcRG3X9xL4Y";
pub const ACCESS_TOKEN: &str = "lBY1xptUJ7ZJSK01x4fNwzw8kAe5b10Q";
pub const ACCESS_TOKEN_SECRET: &str = "hc1wJAOX02pGGJK2uAv1ZOiwS7I9Tpoe";

pub const AUTHORIZATION: &str = "Authorization";
pub const REQUEST_LIMIT_COUNT: &str = "X-Request-Limit-Count";
pub const REQUEST_LIMIT_MAX: &str = "X-Request-Limit-Max";

#[must_use]
pub fn credentials() -> Credentials {
    Credentials::new(
        APP_TOKEN.to_owned(),
        APP_SECRET.to_owned(),
        ACCESS_TOKEN.to_owned(),
        ACCESS_TOKEN_SECRET.to_owned(),
    )
}

pub fn create_client(server: &MockServer) -> anyhow::Result<Client> {
    Ok(Client::new(&server.base_url(), credentials(), Config::default())?)
}

/// Path of `endpoint` below the JSON output segment.
#[must_use]
pub fn path(endpoint: &str) -> String {
    format!("/output.json{endpoint}")
}

/// `count` articles numbered from `first`.
#[must_use]
pub fn articles(first: u64, count: u64) -> Vec<Value> {
    (first..first + count)
        .map(|id| json!({ "idArticle": id, "idProduct": 265_535, "price": 0.25 }))
        .collect()
}
