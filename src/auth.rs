//! Credentials and the one-legged OAuth 1.0a signature used by the Cardmarket API.
//!
//! Every request carries an `Authorization: OAuth ...` header whose signature is an HMAC-SHA1
//! over the request method, the request URL (without its query string, also used as the
//! `realm`) and the union of the OAuth and query parameters.
//! See <https://api.cardmarket.com/ws/documentation/API:Auth_OAuthHeader>.

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac as _};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use reqwest::header::HeaderValue;
/// Secret string types that redact values in debug output for security.
pub use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;

use crate::types::request::Params;
use crate::{Result, Timestamp};

/// Characters left untouched by RFC 3986 percent-encoding.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(crate) const OAUTH_VERSION: &str = "1.0";
pub(crate) const OAUTH_SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// The four tokens of a dedicated or widget app on Cardmarket. The secrets are never printed
/// by [`Debug`].
#[derive(Clone, Debug)]
pub struct Credentials {
    pub(crate) app_token: String,
    pub(crate) app_secret: SecretString,
    pub(crate) access_token: String,
    pub(crate) access_token_secret: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(
        app_token: String,
        app_secret: String,
        access_token: String,
        access_token_secret: String,
    ) -> Self {
        Self {
            app_token,
            app_secret: SecretString::from(app_secret),
            access_token,
            access_token_secret: SecretString::from(access_token_secret),
        }
    }

    /// Returns the app token, sent as `oauth_consumer_key`.
    #[must_use]
    pub fn app_token(&self) -> &str {
        &self.app_token
    }

    /// Returns the app secret.
    #[must_use]
    pub fn app_secret(&self) -> &SecretString {
        &self.app_secret
    }

    /// Returns the access token, sent as `oauth_token`.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the access token secret.
    #[must_use]
    pub fn access_token_secret(&self) -> &SecretString {
        &self.access_token_secret
    }
}

/// Returns the `Authorization` header value for a request to `realm` with the given query
/// `params`.
pub(crate) fn authorization(
    credentials: &Credentials,
    method: &Method,
    realm: &str,
    params: &Params,
    timestamp: Timestamp,
    nonce: &str,
) -> Result<HeaderValue> {
    let oauth = oauth_parameters(credentials, timestamp, nonce);
    let base = signature_base(method, realm, &oauth, params);
    let signature = hmac(credentials, &base)?;

    let mut header = format!("OAuth realm=\"{realm}\"");
    for (key, value) in &oauth {
        let _ = write!(header, ", {key}=\"{}\"", encode(value));
    }
    let _ = write!(header, ", oauth_signature=\"{}\"", encode(&signature));

    Ok(HeaderValue::from_str(&header)?)
}

fn oauth_parameters(
    credentials: &Credentials,
    timestamp: Timestamp,
    nonce: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("oauth_consumer_key", credentials.app_token.clone()),
        ("oauth_nonce", nonce.to_owned()),
        ("oauth_signature_method", OAUTH_SIGNATURE_METHOD.to_owned()),
        ("oauth_timestamp", timestamp.to_string()),
        ("oauth_token", credentials.access_token.clone()),
        ("oauth_version", OAUTH_VERSION.to_owned()),
    ]
}

#[must_use]
fn signature_base(
    method: &Method,
    realm: &str,
    oauth: &[(&'static str, String)],
    params: &Params,
) -> String {
    let mut pairs: Vec<(String, String)> = oauth
        .iter()
        .map(|(key, value)| (encode(key), encode(value)))
        .chain(
            params
                .iter()
                .map(|(key, value)| (encode(key), encode(&value.to_string()))),
        )
        .collect();
    pairs.sort();

    let normalized = pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{method}&{}&{}", encode(realm), encode(&normalized))
}

fn hmac(credentials: &Credentials, message: &str) -> Result<String> {
    let key = format!(
        "{}&{}",
        encode(credentials.app_secret.expose_secret()),
        encode(credentials.access_token_secret.expose_secret())
    );
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())?;
    mac.update(message.as_bytes());

    let result = mac.finalize().into_bytes();
    Ok(STANDARD.encode(result))
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}
