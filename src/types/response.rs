use bon::Builder;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_with::serde_as;

use super::{DateTime, Decimal, Utc};
use crate::Result;
use crate::serde_helpers::{StringFromAny, deserialize_with_warnings};

pub(crate) const REQUEST_LIMIT_COUNT: &str = "X-Request-Limit-Count";
pub(crate) const REQUEST_LIMIT_MAX: &str = "X-Request-Limit-Max";
pub(crate) const EXPIRES: &str = "Expires";

/// Rate limit counters reported by the most recent HTTP response.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests made in the current window (`X-Request-Limit-Count`, 0 when absent).
    pub request_count: u64,
    /// Requests allowed in the current window (`X-Request-Limit-Max`).
    pub request_limit: Option<u64>,
    /// End of the current window (`Expires`). `None` when the header is absent or `0`.
    pub expires: Option<DateTime<Utc>>,
}

impl RateLimit {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
        let number = |name: &str| text(name).and_then(|value| value.trim().parse::<u64>().ok());

        Self {
            request_count: number(REQUEST_LIMIT_COUNT).unwrap_or(0),
            request_limit: number(REQUEST_LIMIT_MAX),
            expires: text(EXPIRES).and_then(parse_expires),
        }
    }

    /// Requests left before the limit is reached, when the limit is known.
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        self.request_limit
            .map(|limit| limit.saturating_sub(self.request_count))
    }
}

/// `Expires` is either a Unix timestamp or an HTTP date.
fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<i64>() {
        return if seconds == 0 {
            None
        } else {
            DateTime::from_timestamp(seconds, 0)
        };
    }

    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Data extracted from a response, paired with the rate limit of the last HTTP response it took
/// to get it.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    pub data: T,
    pub rate_limit: RateLimit,
}

impl<T> Response<T> {
    #[must_use]
    pub fn new(data: T, rate_limit: RateLimit) -> Self {
        Self { data, rate_limit }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Response<U> {
        Response {
            data: f(self.data),
            rate_limit: self.rate_limit,
        }
    }

    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }
}

impl Response<Value> {
    /// Decodes a single entity. `null`, and the empty list returned for unexpected statuses,
    /// decode to `None`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Response<Option<T>>> {
        let data = match self.data {
            Value::Null => None,
            Value::Array(items) if items.is_empty() => None,
            value => Some(deserialize_with_warnings(value)?),
        };

        Ok(Response::new(data, self.rate_limit))
    }

    /// Decodes a list of entities. `null` decodes to an empty list and a lone object to a
    /// one-element list.
    pub fn decode_list<T: DeserializeOwned>(self) -> Result<Response<Vec<T>>> {
        let data = match self.data {
            Value::Null => Vec::new(),
            Value::Array(items) => items
                .into_iter()
                .map(deserialize_with_warnings)
                .collect::<Result<_>>()?,
            value => vec![deserialize_with_warnings(value)?],
        };

        Ok(Response::new(data, self.rate_limit))
    }
}

/// A product name in one language.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Builder)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct Localization {
    pub id_language: u32,
    #[serde(default)]
    pub language_name: String,
    #[serde(default)]
    pub name: String,
}

/// A single printing of a card (or any other sellable item).
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Builder)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id_product: u64,
    pub id_metaproduct: Option<u64>,
    pub count_reprints: Option<u32>,
    #[serde(default)]
    #[builder(default)]
    pub en_name: String,
    #[serde(default, alias = "locName")]
    #[builder(default)]
    pub localization: Vec<Localization>,
    pub website: Option<String>,
    pub image: Option<String>,
    pub game_name: Option<String>,
    pub category_name: Option<String>,
    pub rarity: Option<String>,
    pub expansion_name: Option<String>,
}

/// The card itself, grouping all of its printings.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Builder)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct Metaproduct {
    pub id_metaproduct: u64,
    #[serde(default)]
    #[builder(default)]
    pub en_name: String,
    #[serde(default, alias = "locName")]
    #[builder(default)]
    pub localization: Vec<Localization>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Builder)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct ArticleLanguage {
    pub id_language: u32,
    #[serde(default)]
    pub language_name: String,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Builder)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id_user: u64,
    #[serde(default)]
    pub username: String,
}

/// An offer for a product by one seller.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Builder)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id_article: u64,
    pub id_product: Option<u64>,
    pub language: Option<ArticleLanguage>,
    pub comments: Option<String>,
    /// Price in EUR.
    pub price: Option<Decimal>,
    pub count: Option<u32>,
    pub in_shopping_cart: Option<bool>,
    pub seller: Option<Seller>,
    pub condition: Option<String>,
    pub is_foil: Option<bool>,
    pub is_signed: Option<bool>,
    pub is_altered: Option<bool>,
    pub is_playset: Option<bool>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Builder)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct Expansion {
    pub id_expansion: u64,
    #[serde(default)]
    #[builder(default)]
    pub en_name: String,
    pub abbreviation: Option<String>,
    pub release_date: Option<String>,
    pub is_released: Option<bool>,
    pub id_game: Option<u32>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Builder)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct Wantslist {
    #[serde(alias = "idWantsList")]
    pub id_wantslist: u64,
    #[serde(default)]
    #[builder(default)]
    pub name: String,
    pub item_count: Option<u32>,
}

/// One entry of a want-list, wanting either a product or any printing of a metaproduct.
#[serde_as]
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, PartialEq, Builder)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct Want {
    #[serde_as(as = "StringFromAny")]
    pub id_want: String,
    pub count: Option<u32>,
    pub wish_price: Option<Decimal>,
    /// `product` or `metaproduct`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub product: Option<Value>,
    pub metaproduct: Option<Value>,
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn rate_limit_defaults_when_headers_are_missing() {
        let rate_limit = RateLimit::from_headers(&HeaderMap::new());

        assert_eq!(rate_limit, RateLimit::default());
        assert_eq!(rate_limit.request_count, 0);
        assert!(rate_limit.expires.is_none());
    }

    #[test]
    fn rate_limit_reads_headers() {
        let rate_limit = RateLimit::from_headers(&headers(&[
            (REQUEST_LIMIT_COUNT, "42"),
            (REQUEST_LIMIT_MAX, "5000"),
            (EXPIRES, "Wed, 21 Oct 2015 07:28:00 GMT"),
        ]));

        assert_eq!(rate_limit.request_count, 42);
        assert_eq!(rate_limit.request_limit, Some(5000));
        assert_eq!(rate_limit.remaining(), Some(4958));
        assert_eq!(
            rate_limit.expires,
            DateTime::from_timestamp(1_445_412_480, 0)
        );
    }

    #[test]
    fn expires_accepts_timestamps() {
        assert_eq!(
            parse_expires("1445412480"),
            DateTime::from_timestamp(1_445_412_480, 0)
        );
        assert_eq!(parse_expires("0"), None);
        assert_eq!(parse_expires("-1"), DateTime::from_timestamp(-1, 0));
        assert_eq!(parse_expires("soon"), None);
    }

    #[test]
    fn malformed_count_falls_back_to_zero() {
        let rate_limit = RateLimit::from_headers(&headers(&[(REQUEST_LIMIT_COUNT, "many")]));

        assert_eq!(rate_limit.request_count, 0);
    }

    #[test]
    fn decode_null_is_none() -> Result<()> {
        let response = Response::new(Value::Null, RateLimit::default()).decode::<Product>()?;

        assert!(response.data.is_none());

        let empty = Response::new(json!([]), RateLimit::default()).decode::<Product>()?;
        assert!(empty.data.is_none());

        Ok(())
    }

    #[test]
    fn decode_list_accepts_null_object_and_array() -> Result<()> {
        let none = Response::new(Value::Null, RateLimit::default()).decode_list::<Expansion>()?;
        assert!(none.data.is_empty());

        let one = Response::new(json!({"idExpansion": 1469}), RateLimit::default())
            .decode_list::<Expansion>()?;
        assert_eq!(one.data.len(), 1);

        let many = Response::new(
            json!([{"idExpansion": 1}, {"idExpansion": 2}]),
            RateLimit::default(),
        )
        .decode_list::<Expansion>()?;
        assert_eq!(
            many.data.iter().map(|e| e.id_expansion).collect::<Vec<_>>(),
            [1, 2]
        );

        Ok(())
    }

    #[test]
    fn product_skips_unknown_fields() -> Result<()> {
        let response = Response::new(
            json!({
                "idProduct": 265_535,
                "idMetaproduct": 6762,
                "enName": "Giant Spider",
                "localization": [
                    {"idLanguage": 1, "languageName": "English", "name": "Giant Spider"},
                    {"idLanguage": 2, "languageName": "French", "name": "Araignée géante"}
                ],
                "rarity": "Common",
                "number": "166"
            }),
            RateLimit::default(),
        )
        .decode::<Product>()?;

        let product = response.data.expect("product");
        assert_eq!(product.id_product, 265_535);
        assert_eq!(product.id_metaproduct, Some(6762));
        assert_eq!(product.localization[1].name, "Araignée géante");
        assert_eq!(product.rarity.as_deref(), Some("Common"));

        Ok(())
    }

    #[test]
    fn article_price_is_decimal() -> Result<()> {
        let response = Response::new(
            json!([{
                "idArticle": 1,
                "idProduct": 5340,
                "language": {"idLanguage": 1, "languageName": "English"},
                "price": 0.35,
                "count": 4,
                "seller": {"idUser": 9, "username": "karl"},
                "isFoil": false
            }]),
            RateLimit::default(),
        )
        .decode_list::<Article>()?;

        let article = &response.data[0];
        assert_eq!(article.price, Some(dec!(0.35)));
        assert_eq!(article.seller.as_ref().map(|s| s.id_user), Some(9));
        assert_eq!(article.is_foil, Some(false));

        Ok(())
    }

    #[test]
    fn want_id_accepts_strings_and_numbers() -> Result<()> {
        let response = Response::new(
            json!([
                {"idWant": "5741fb3f4b8d", "count": 1, "type": "product"},
                {"idWant": 17, "wishPrice": "1.50", "type": "metaproduct"}
            ]),
            RateLimit::default(),
        )
        .decode_list::<Want>()?;

        assert_eq!(response.data[0].id_want, "5741fb3f4b8d");
        assert_eq!(response.data[1].id_want, "17");
        assert_eq!(response.data[1].wish_price, Some(dec!(1.50)));
        assert_eq!(response.data[1].kind.as_deref(), Some("metaproduct"));

        Ok(())
    }

    #[test]
    fn response_map_keeps_rate_limit() {
        let rate_limit = RateLimit {
            request_count: 3,
            ..RateLimit::default()
        };
        let response = Response::new(2, rate_limit).map(|n| n * 2);

        assert_eq!(response.data, 4);
        assert_eq!(response.rate_limit, rate_limit);
        assert_eq!(response.into_data(), 4);
    }
}
