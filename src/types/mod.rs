//! Types shared by the [`crate::client::Client`] operations, plus re-exports of external types
//! used in the public API.

/// Date and time types for rate limit expiry.
pub use chrono::{DateTime, Utc};
/// Arbitrary precision decimal type for prices.
pub use rust_decimal::Decimal;

pub mod request;
pub mod response;

/// Card languages as numbered by Cardmarket (`idLanguage`).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Language {
    #[default]
    English = 1,
    French = 2,
    German = 3,
    Spanish = 4,
    Italian = 5,
    SimplifiedChinese = 6,
    Japanese = 7,
    Portuguese = 8,
    Russian = 9,
    Korean = 10,
    TraditionalChinese = 11,
}

impl Language {
    /// Returns the Cardmarket `idLanguage` of this language.
    #[must_use]
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// What a `PUT /shoppingcart` call does with the listed articles.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CartAction {
    Add,
    Remove,
}
