//! Serde helpers for the loosely typed Cardmarket responses.
//!
//! With the `tracing` feature, decoding also reports unknown fields and the path of the field
//! that made decoding fail.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// A `serde_as` type that deserializes strings or integers as `String`.
///
/// Use with `#[serde_as(as = "StringFromAny")]` on `String` fields.
pub struct StringFromAny;

impl<'de> serde_with::DeserializeAs<'de, String> for StringFromAny {
    fn deserialize_as<D>(deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use std::fmt;

        use serde::de::{self, Visitor};

        struct StringOrNumberVisitor;

        impl Visitor<'_> for StringOrNumberVisitor {
            type Value = String;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("string or integer")
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_owned())
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v)
            }

            fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_string())
            }

            fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_string())
            }
        }

        deserializer.deserialize_any(StringOrNumberVisitor)
    }
}

/// Deserialize JSON, logging every field the target type does not capture.
///
/// Unknown fields are never an error. When decoding fails, the path of the offending field is
/// logged before the error is returned.
#[cfg(feature = "tracing")]
pub fn deserialize_with_warnings<T: DeserializeOwned>(value: Value) -> crate::Result<T> {
    use std::any::type_name;

    tracing::trace!(type_name = %type_name::<T>(), json = %value, "deserializing JSON");

    let original = value.clone();
    let mut unknown_paths: Vec<String> = Vec::new();

    let result: T = serde_ignored::deserialize(value, |path| {
        unknown_paths.push(path.to_string());
    })
    .inspect_err(|_| {
        let path_result: Result<T, _> = serde_path_to_error::deserialize(original.clone());
        if let Err(path_err) = path_result {
            let path = path_err.path().to_string();
            tracing::error!(
                type_name = %type_name::<T>(),
                path = %path,
                value = %format_value(lookup_value(&original, &path)),
                error = %path_err.inner(),
                "deserialization failed"
            );
        }
    })?;

    for path in unknown_paths {
        tracing::warn!(
            type_name = %type_name::<T>(),
            field = %path,
            value = %format_value(lookup_value(&original, &path)),
            "unknown field in API response"
        );
    }

    Ok(result)
}

/// Pass-through deserialization when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub fn deserialize_with_warnings<T: DeserializeOwned>(value: Value) -> crate::Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Look up a value by a `serde_ignored`/`serde_path_to_error` path such as `product.0.name`,
/// `product[0].name` or `seller?.username`.
#[cfg(feature = "tracing")]
fn lookup_value<'value>(value: &'value Value, path: &str) -> Option<&'value Value> {
    let mut current = value;

    for segment in path
        .split(['.', '[', ']'])
        .filter(|segment| !segment.is_empty() && *segment != "?")
    {
        let segment = segment.trim_end_matches('?');
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

#[cfg(feature = "tracing")]
fn format_value(value: Option<&Value>) -> String {
    value.map_or_else(|| "<unable to retrieve>".to_owned(), Value::to_string)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Localization {
        id_language: u32,
        #[serde(default)]
        name: Option<String>,
    }

    #[test]
    fn deserialize_known_fields_only() {
        let json = serde_json::json!({ "idLanguage": 2, "name": "Araignée géante" });

        let result: Localization = deserialize_with_warnings(json).expect("deserialization failed");
        assert_eq!(result.id_language, 2);
        assert_eq!(result.name.as_deref(), Some("Araignée géante"));
    }

    #[test]
    fn unknown_fields_are_not_an_error() {
        let json = serde_json::json!({ "idLanguage": 1, "languageName": "English" });

        let result: Localization = deserialize_with_warnings(json).expect("deserialization failed");
        assert_eq!(result.id_language, 1);
        assert_eq!(result.name, None);
    }

    #[test]
    fn missing_required_field_fails() {
        let json = serde_json::json!({ "name": "Giant Spider" });

        let result: crate::Result<Localization> = deserialize_with_warnings(json);
        result.unwrap_err();
    }

    #[derive(Debug, Deserialize)]
    struct WithId {
        #[serde(with = "serde_with::As::<StringFromAny>")]
        id: String,
    }

    #[test]
    fn string_from_any_accepts_strings_and_integers() {
        let text: WithId =
            serde_json::from_value(serde_json::json!({ "id": "5741fb3f" })).expect("string");
        let number: WithId =
            serde_json::from_value(serde_json::json!({ "id": 12345 })).expect("integer");
        let negative: WithId =
            serde_json::from_value(serde_json::json!({ "id": -42 })).expect("negative");

        assert_eq!(text.id, "5741fb3f");
        assert_eq!(number.id, "12345");
        assert_eq!(negative.id, "-42");
    }

    #[test]
    fn string_from_any_rejects_floats() {
        let result = serde_json::from_value::<WithId>(serde_json::json!({ "id": 1.5 }));

        result.unwrap_err();
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn lookup_value_follows_paths() {
        let json = serde_json::json!({
            "product": [{ "localization": [{ "name": "Giant Spider" }] }]
        });

        assert_eq!(
            lookup_value(&json, "product.0.localization[0].name"),
            Some(&serde_json::json!("Giant Spider"))
        );
        assert_eq!(lookup_value(&json, "product.3"), None);
        assert_eq!(lookup_value(&json, ""), Some(&json));
        assert_eq!(format_value(None), "<unable to retrieve>");
    }

    #[cfg(feature = "tracing")]
    fn captured_logs<F: FnOnce()>(f: F) -> String {
        use std::sync::{Arc, Mutex};

        use tracing_subscriber::layer::SubscriberExt as _;

        #[derive(Clone)]
        struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for CaptureWriter {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().expect("lock").extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Arc::new(Mutex::new(Vec::new()));
        let writer = CaptureWriter(Arc::clone(&captured));
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(move || writer.clone())
            .with_ansi(false);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, f);

        String::from_utf8_lossy(&captured.lock().expect("lock")).into_owned()
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn warning_is_emitted_for_unknown_fields() {
        let output = captured_logs(|| {
            let json = serde_json::json!({ "idLanguage": 1, "languageName": "English" });
            let _: Localization = deserialize_with_warnings(json).expect("deserialization failed");
        });

        assert!(output.contains("unknown field"), "got: {output}");
        assert!(output.contains("languageName"), "got: {output}");
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn warning_is_emitted_for_unknown_nested_product_fields() {
        use crate::types::response::Product;

        let output = captured_logs(|| {
            let json = serde_json::json!({
                "idProduct": 265_535,
                "number": "166",
                "localization": [{ "idLanguage": 2, "name": "Araignée géante", "flavour": "Tisse" }]
            });
            let product: Product = deserialize_with_warnings(json).expect("deserialization failed");
            assert_eq!(product.id_product, 265_535);
        });

        assert!(output.contains("number"), "got: {output}");
        assert!(output.contains("flavour"), "got: {output}");
        assert!(output.contains("\"Tisse\""), "got: {output}");
    }
}
