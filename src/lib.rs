#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub(crate) mod serde_helpers;
pub mod types;
pub mod xml;

pub use client::{Client, Config};
use serde::Serialize;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Host of the live Cardmarket API, version 2.0.
pub const PRODUCTION_URL: &str = "https://api.cardmarket.com/ws/v2.0";

/// Host of the Cardmarket sandbox, version 2.0.
pub const SANDBOX_URL: &str = "https://sandbox.cardmarket.com/ws/v2.0";

/// Path segment selecting JSON output, inserted between the host and every endpoint path.
pub const OUTPUT_FORMAT: &str = "/output.json";

/// Largest page the API returns for a paginated (206) response.
pub const PAGE_SIZE: u16 = 1000;

/// `idGame` of Magic: The Gathering.
pub const MAGIC_THE_GATHERING: u32 = 1;

/// Timestamp in seconds since [`std::time::UNIX_EPOCH`]
pub(crate) type Timestamp = i64;

/// Trait for converting request parameters to a URL query string.
///
/// This trait is automatically implemented for all types that implement [`Serialize`].
/// It uses [`serde_html_form`] to serialize the fields, so values are form-url-encoded
/// (a space becomes `+`). Map keys are written in iteration order, which for
/// [`types::request::Params`] is ascending.
pub trait ToQueryParams: Serialize {
    /// Returns an empty string if there are no parameters, otherwise a string starting with `?`
    /// followed by `key=value` pairs joined with `&`.
    fn query_params(&self) -> Result<String> {
        let params = serde_html_form::to_string(self)?;

        if params.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!("?{params}"))
        }
    }
}

impl<T: Serialize> ToQueryParams for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::request::{ParamValue, Params};

    #[test]
    fn empty_params_have_no_query() -> Result<()> {
        assert_eq!(Params::new().query_params()?, "");

        Ok(())
    }

    #[test]
    fn query_keys_are_sorted_and_values_encoded() -> Result<()> {
        let mut params = Params::new();
        params.insert("search".to_owned(), ParamValue::from("Jace, the Mind Sculptor"));
        params.insert("start".to_owned(), ParamValue::from(1000));
        params.insert("exact".to_owned(), ParamValue::from(true));
        params.insert("maxResults".to_owned(), ParamValue::from(1000));
        params.insert("idLanguage".to_owned(), ParamValue::from(2));

        assert_eq!(
            params.query_params()?,
            "?exact=true&idLanguage=2&maxResults=1000&search=Jace%2C+the+Mind+Sculptor&start=1000"
        );

        Ok(())
    }

    #[test]
    fn reserved_characters_are_encoded() -> Result<()> {
        let mut params = Params::new();
        params.insert("search".to_owned(), ParamValue::from("Æther & Vial/Ø=?"));

        let query = params.query_params()?;

        assert_eq!(query, "?search=%C3%86ther+%26+Vial%2F%C3%98%3D%3F");

        Ok(())
    }
}
