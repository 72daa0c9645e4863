//! Relevancy ordering lists fetched over REST.

use serde_json::Value;

use crate::converter::{ConvertedFilter, ResponseConverter};
use crate::error::{FilterError, FilterResult};

pub const STRING_LIST: &str = "stringList";

/// Reads a JSON array of strings, preserving order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevancyResponseConverter;

impl RelevancyResponseConverter {
    pub const NAME: &'static str = "relevancy";
}

impl ResponseConverter<Vec<String>> for RelevancyResponseConverter {
    fn response_type(&self) -> &str {
        STRING_LIST
    }

    fn convert(&self, response: Value) -> FilterResult<ConvertedFilter<Vec<String>>> {
        let items = match response {
            Value::Null => Vec::new(),
            Value::Array(items) => items,
            other => {
                return Err(FilterError::Retrieval(format!(
                    "Expected a list of relevancy terms, got: {other}"
                )));
            }
        };

        let terms = items
            .into_iter()
            .map(|item| match item {
                Value::String(term) => Ok(term),
                other => Err(FilterError::Retrieval(format!(
                    "Relevancy term is not a string: {other}"
                ))),
            })
            .collect::<FilterResult<Vec<_>>>()?;
        Ok(ConvertedFilter::new(terms))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keeps_order() {
        let converted = RelevancyResponseConverter
            .convert(json!(["GO:3", "GO:1", "GO:2"]))
            .unwrap();
        assert_eq!(converted.into_value(), ["GO:3", "GO:1", "GO:2"]);
    }

    #[test]
    fn null_and_empty_are_empty() {
        for body in [Value::Null, json!([])] {
            let converted = RelevancyResponseConverter.convert(body).unwrap();
            assert!(converted.into_value().is_empty());
        }
    }

    #[test]
    fn non_strings_are_retrieval_errors() {
        assert!(matches!(
            RelevancyResponseConverter.convert(json!(["GO:1", 2])),
            Err(FilterError::Retrieval(_))
        ));
        assert!(matches!(
            RelevancyResponseConverter.convert(json!({"terms": []})),
            Err(FilterError::Retrieval(_))
        ));
    }
}
