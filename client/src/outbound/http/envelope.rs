//! Normalisation of the catalogue response envelope.
//!
//! The listing endpoint has answered with a bare array, `{opportunities}`,
//! `{data}`, and a lone listing object. The shape is resolved here once;
//! callers only ever see a flat list.

use serde_json::Value;

/// Outcome of normalising a catalogue body.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum CatalogEnvelope {
    /// Raw listing objects, in response order.
    Listings(Vec<Value>),
    /// Nothing listing-shaped was found.
    Malformed(String),
}

pub(super) fn normalise(body: Value) -> CatalogEnvelope {
    match body {
        Value::Array(items) => CatalogEnvelope::Listings(items),
        Value::Object(mut map) => {
            for key in ["opportunities", "data"] {
                match map.remove(key) {
                    Some(Value::Array(items)) => return CatalogEnvelope::Listings(items),
                    Some(other) => {
                        return CatalogEnvelope::Malformed(format!(
                            "`{key}` is {}, not an array",
                            kind(&other)
                        ));
                    }
                    None => {}
                }
            }
            CatalogEnvelope::Listings(vec![Value::Object(map)])
        }
        other => CatalogEnvelope::Malformed(format!("body is {}", kind(&other))),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for envelope shapes.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn listings() -> Vec<Value> {
        vec![json!({ "_id": "o1" }), json!({ "_id": "o2" })]
    }

    #[rstest]
    #[case::bare(json!([{ "_id": "o1" }, { "_id": "o2" }]))]
    #[case::opportunities(json!({ "opportunities": [{ "_id": "o1" }, { "_id": "o2" }] }))]
    #[case::data(json!({ "success": true, "data": [{ "_id": "o1" }, { "_id": "o2" }] }))]
    fn every_tolerated_shape_yields_the_same_list(#[case] body: Value) {
        assert_eq!(normalise(body), CatalogEnvelope::Listings(listings()));
    }

    #[test]
    fn single_object_is_wrapped() {
        assert_eq!(
            normalise(json!({ "_id": "o1" })),
            CatalogEnvelope::Listings(vec![json!({ "_id": "o1" })])
        );
    }

    #[rstest]
    #[case(json!("nope"))]
    #[case(json!(null))]
    #[case(json!({ "data": { "_id": "o1" } }))]
    fn non_listing_bodies_are_malformed(#[case] body: Value) {
        assert!(matches!(normalise(body), CatalogEnvelope::Malformed(_)));
    }
}
